pub mod admin;
pub mod files;
pub mod health;
pub mod search;

pub use admin::admin_list_files;
pub use files::{delete_file, download_file, list_files, upload_files};
pub use health::{health_check, healthz, metrics_endpoint, readiness_check};
pub use search::search_content;
