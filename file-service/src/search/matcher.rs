use serde::{Deserialize, Serialize};

/// Longest line text returned for a single match, in characters.
pub const MAX_LINE_CHARS: usize = 400;

/// One matching line of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
}

/// First `max_matches` lines of `text` that contain `query`, ignoring case.
///
/// Lines are numbered from 1 in document order. Scanning stops as soon as
/// the cap is reached. An empty query matches nothing.
pub fn find_matches(text: &str, query: &str, max_matches: usize) -> Vec<LineMatch> {
    let mut matches = Vec::new();
    if query.is_empty() || max_matches == 0 {
        return matches;
    }

    let needle = query.to_lowercase();
    for (idx, line) in text.lines().enumerate() {
        if line.to_lowercase().contains(&needle) {
            matches.push(LineMatch {
                line: idx + 1,
                text: line.chars().take(MAX_LINE_CHARS).collect(),
            });
            if matches.len() >= max_matches {
                break;
            }
        }
    }

    matches
}
