use crate::config::{FileServiceConfig, MetadataBackend, StorageBackend};
use crate::handlers;
use crate::search::ContentSearch;
use crate::services::{
    FileRepository, IdentityVerifier, InMemoryFileRepository, InMemoryStorage,
    JwtIdentityVerifier, LocalStorage, MongoDb, Storage,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{delete, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: FileServiceConfig,
    pub repo: Arc<dyn FileRepository>,
    pub storage: Arc<dyn Storage>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub search: ContentSearch,
}

impl AppState {
    pub fn new(
        config: FileServiceConfig,
        repo: Arc<dyn FileRepository>,
        storage: Arc<dyn Storage>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            config,
            search: ContentSearch::new(repo.clone()),
            repo,
            storage,
            identity,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/files",
            get(handlers::list_files).post(handlers::upload_files),
        )
        .route("/api/files/search-content", get(handlers::search_content))
        .route("/api/files/:id/download", get(handlers::download_file))
        .route("/api/files/:id", delete(handlers::delete_file))
        .route("/api/admin/files", get(handlers::admin_list_files))
        .layer(DefaultBodyLimit::max(state.config.upload.max_request_bytes));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(api)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.cors.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| {
            o.parse::<HeaderValue>()
                .inspect_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: FileServiceConfig) -> Result<Self, AppError> {
        let identity: Arc<dyn IdentityVerifier> =
            Arc::new(JwtIdentityVerifier::new(&config.identity)?);
        Self::build_with_identity(config, identity).await
    }

    /// Build with a caller-supplied identity verifier in place of the
    /// configured JWT one.
    pub async fn build_with_identity(
        config: FileServiceConfig,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Result<Self, AppError> {
        let repo = connect_metadata(&config).await?;
        let storage = open_storage(&config).await?;
        let state = AppState::new(config.clone(), repo, storage, identity);

        let router = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn connect_metadata(config: &FileServiceConfig) -> Result<Arc<dyn FileRepository>, AppError> {
    match config.metadata.backend {
        MetadataBackend::Mongo => {
            let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    e
                })?;
            db.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(db))
        }
        MetadataBackend::Memory => {
            tracing::warn!("Using in-memory metadata store; records are lost on restart");
            Ok(Arc::new(InMemoryFileRepository::new()))
        }
    }
}

async fn open_storage(config: &FileServiceConfig) -> Result<Arc<dyn Storage>, AppError> {
    match config.storage.backend {
        StorageBackend::Local => {
            let storage = LocalStorage::new(&config.storage.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.storage.local_path,
                        e
                    );
                    e
                })?;
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object store; file bytes are lost on restart");
            Ok(Arc::new(InMemoryStorage::new()))
        }
    }
}
