use crate::dtos::FileResponse;
use crate::search::LineMatch;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters of `GET /api/files/search-content`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SearchParams {
    pub q: Option<String>,
    /// `mine` (default) or `all`.
    pub scope: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub max_results: Option<usize>,
    #[validate(range(min = 1, max = 100))]
    pub max_matches_per_file: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub file: FileResponse,
    pub matches: Vec<LineMatch>,
}

/// Result of one content search.
///
/// `skipped_unsupported` counts files with no searchable text, whatever
/// their type; it keeps the `skipped_pdf` key on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub q: String,
    pub items: Vec<SearchHit>,
    #[serde(rename = "skipped_pdf")]
    pub skipped_unsupported: usize,
    pub truncated_files: usize,
}

impl SearchResponse {
    pub fn new(query: &str) -> Self {
        Self {
            q: query.to_string(),
            items: Vec::new(),
            skipped_unsupported: 0,
            truncated_files: 0,
        }
    }
}
