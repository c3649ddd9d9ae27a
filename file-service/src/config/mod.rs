use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct FileServiceConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub metadata: MetadataConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub search: SearchConfig,
    pub upload: UploadConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub backend: MetadataBackend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetadataBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorageBackend {
    Local,
    Memory,
}

#[derive(Clone)]
pub struct IdentityConfig {
    /// Identity-provider project; tokens must name it as audience.
    pub project_id: String,
    /// PEM public key for RS256 tokens.
    pub public_key_path: Option<String>,
    /// HS256 secret, for local development only.
    pub shared_secret: Option<String>,
    pub admin_emails: Vec<String>,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("project_id", &self.project_id)
            .field("public_key_path", &self.public_key_path)
            .field(
                "shared_secret",
                &self.shared_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("admin_emails", &self.admin_emails)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub default_max_results: usize,
    pub max_matches_per_file: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: 25,
            max_matches_per_file: 10,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadConfig {
    /// Largest single file accepted.
    pub max_file_bytes: usize,
    /// Largest multipart body accepted, across all files.
    pub max_request_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 20 * 1024 * 1024,
            max_request_bytes: 100 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5174,http://127.0.0.1:5174";

impl FileServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let metadata_backend: MetadataBackend =
            parse_value("METADATA_BACKEND", &get_env("METADATA_BACKEND", Some("mongo"), is_prod)?)?;
        let mongo_uri = if metadata_backend == MetadataBackend::Mongo {
            get_env("MONGODB_URI", None, is_prod)?
        } else {
            env::var("MONGODB_URI").unwrap_or_default()
        };

        let search_defaults = SearchConfig::default();
        let upload_defaults = UploadConfig::default();

        Ok(FileServiceConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: mongo_uri,
                database: get_env("MONGODB_DATABASE", Some("file_db"), is_prod)?,
            },
            metadata: MetadataConfig {
                backend: metadata_backend,
            },
            storage: StorageConfig {
                backend: parse_value(
                    "STORAGE_BACKEND",
                    &get_env("STORAGE_BACKEND", Some("local"), is_prod)?,
                )?,
                local_path: get_env("STORAGE_LOCAL_PATH", Some("storage"), is_prod)?,
            },
            identity: IdentityConfig {
                project_id: get_env("IDENTITY_PROJECT_ID", Some("file-management-local"), is_prod)?,
                public_key_path: env::var("IDENTITY_PUBLIC_KEY_PATH").ok(),
                shared_secret: env::var("IDENTITY_SHARED_SECRET").ok(),
                admin_emails: split_list(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            },
            search: SearchConfig {
                default_max_results: env_or("SEARCH_DEFAULT_MAX_RESULTS", search_defaults.default_max_results)?,
                max_matches_per_file: env_or("SEARCH_MAX_MATCHES_PER_FILE", search_defaults.max_matches_per_file)?,
            },
            upload: UploadConfig {
                max_file_bytes: env_or("UPLOAD_MAX_FILE_BYTES", upload_defaults.max_file_bytes)?,
                max_request_bytes: env_or(
                    "UPLOAD_MAX_REQUEST_BYTES",
                    upload_defaults.max_request_bytes,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: split_list(
                    &env::var("CORS_ALLOWED_ORIGINS")
                        .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
                ),
            },
        })
    }
}

impl FromStr for MetadataBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(MetadataBackend::Mongo),
            "memory" => Ok(MetadataBackend::Memory),
            _ => Err(format!("Invalid metadata backend: {}", s)),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(val) => parse_value(key, &val),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
