pub mod files;
pub mod search;

pub use files::{FileResponse, FilesResponse, ListParams, OkResponse, SortKey, SortOrder};
pub use search::{SearchHit, SearchParams, SearchResponse};
