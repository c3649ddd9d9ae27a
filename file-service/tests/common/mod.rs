#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use file_service::config::{
    CorsConfig, FileServiceConfig, IdentityConfig, MetadataBackend, MetadataConfig, MongoConfig,
    SearchConfig, StorageBackend, StorageConfig, UploadConfig,
};
use file_service::models::FileRecord;
use file_service::services::{
    Caller, FileFilter, FileRepository, IdentityVerifier, InMemoryFileRepository,
    InMemoryStorage, Storage,
};
use file_service::startup::{build_router, AppState};
use http_body_util::BodyExt;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const USER_TOKEN: &str = "user";
pub const OTHER_TOKEN: &str = "other";
pub const ADMIN_TOKEN: &str = "admin";

pub const USER_UID: &str = "user_uid";
pub const OTHER_UID: &str = "other_uid";
pub const ADMIN_UID: &str = "admin_uid";

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Accepts a fixed set of opaque tokens.
pub struct FakeVerifier;

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<Caller, AppError> {
        let (uid, email, is_admin) = match token {
            USER_TOKEN => (USER_UID, "user@test.com", false),
            OTHER_TOKEN => (OTHER_UID, "other@test.com", false),
            ADMIN_TOKEN => (ADMIN_UID, "admin@test.com", true),
            _ => return Err(AppError::Unauthorized(anyhow::anyhow!("Invalid token"))),
        };
        Ok(Caller {
            uid: uid.to_string(),
            email: email.to_string(),
            is_admin,
        })
    }
}

/// Metadata store that fails every operation except the health check.
pub struct UnreadableRepository;

#[async_trait]
impl FileRepository for UnreadableRepository {
    async fn insert(&self, _record: &FileRecord) -> Result<(), AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("unreadable")))
    }

    async fn get(&self, _id: &str) -> Result<Option<FileRecord>, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("unreadable")))
    }

    async fn delete(&self, _id: &str) -> Result<bool, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("unreadable")))
    }

    async fn list(&self, _filter: &FileFilter) -> Result<Vec<FileRecord>, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("unreadable")))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Object store whose deletes always fail.
#[derive(Default)]
pub struct UndeletableStorage {
    pub inner: InMemoryStorage,
}

#[async_trait]
impl Storage for UndeletableStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        self.inner.upload(key, data).await
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        self.inner.download(key).await
    }

    async fn delete(&self, _key: &str) -> Result<(), AppError> {
        Err(AppError::StorageError(anyhow::anyhow!("undeletable")))
    }
}

pub fn test_config() -> FileServiceConfig {
    FileServiceConfig {
        common: CoreConfig {
            port: 0,
            ..Default::default()
        },
        mongodb: MongoConfig {
            uri: String::new(),
            database: "file_test".to_string(),
        },
        metadata: MetadataConfig {
            backend: MetadataBackend::Memory,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            local_path: String::new(),
        },
        identity: IdentityConfig {
            project_id: "file-manager-test".to_string(),
            public_key_path: None,
            shared_secret: None,
            admin_emails: vec![],
        },
        search: SearchConfig::default(),
        upload: UploadConfig::default(),
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5174".to_string()],
        },
    }
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }
}

/// Router over in-memory stores, driven in-process.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryFileRepository>,
    pub storage: Arc<InMemoryStorage>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: FileServiceConfig) -> Self {
        let repo = Arc::new(InMemoryFileRepository::new());
        let storage = Arc::new(InMemoryStorage::new());
        let state = AppState::new(config, repo.clone(), storage.clone(), Arc::new(FakeVerifier));

        Self {
            router: build_router(state),
            repo,
            storage,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response {
        self.request(Method::GET, uri, Some(token)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response {
        self.request(Method::DELETE, uri, Some(token)).await
    }

    /// POST `files` as multipart parts named `files`.
    pub async fn upload(&self, token: &str, files: &[(&str, &str)]) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/files")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body("files", files)))
            .unwrap();
        self.send(request).await
    }

    /// Upload one file and return its id.
    pub async fn upload_one(&self, token: &str, name: &str, content: &str) -> String {
        let response = self.upload(token, &[(name, content)]).await;
        assert_eq!(response.status, StatusCode::OK, "upload of {} failed", name);
        response.json()["items"][0]["id"]
            .as_str()
            .expect("Missing id")
            .to_string()
    }

    pub async fn insert(&self, record: &FileRecord) {
        self.repo.insert(record).await.expect("Failed to insert record");
    }
}

pub fn multipart_body(field: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
