//! Content search: text extraction at upload, per-line matching, and the
//! scoped, capped search over stored files.

pub mod extract;
pub mod matcher;
pub mod orchestrator;

pub use extract::{extract_text, MAX_EXTRACTED_BYTES};
pub use matcher::{find_matches, LineMatch, MAX_LINE_CHARS};
pub use orchestrator::{collect_hits, ContentSearch, Scope, SearchLimits};
