pub mod database;
pub mod identity;
pub mod listing;
pub mod memory;
pub mod metrics;
pub mod storage;

pub use database::{FileFilter, FileRepository, MongoDb};
pub use identity::{AdminAllowList, Caller, IdentityVerifier, JwtIdentityVerifier};
pub use listing::apply_listing;
pub use memory::InMemoryFileRepository;
pub use metrics::{get_metrics, init_metrics};
pub use storage::{InMemoryStorage, LocalStorage, Storage};
