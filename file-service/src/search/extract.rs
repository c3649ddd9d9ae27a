//! Plain-text extraction for content search.
//!
//! Runs once at upload time. Extraction never fails an upload: anything that
//! cannot be turned into text yields `None`, which search later counts as an
//! unsupported file.

use crate::models::FileType;
use std::panic::{self, AssertUnwindSafe};

/// Upper bound on stored searchable text per file.
pub const MAX_EXTRACTED_BYTES: usize = 1_000_000;

/// Best-effort plain-text representation of `bytes` for `file_type`.
pub fn extract_text(bytes: &[u8], file_type: &FileType) -> Option<String> {
    let text = match file_type {
        FileType::Txt | FileType::Json => decode_text(bytes)?,
        FileType::Pdf => extract_pdf(bytes)?,
        FileType::Other(_) => return None,
    };

    Some(clip_to_char_boundary(text, MAX_EXTRACTED_BYTES))
}

fn decode_text(bytes: &[u8]) -> Option<String> {
    // NUL bytes mean binary content behind a text extension
    if bytes.contains(&0) {
        return None;
    }
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).ok()
}

fn extract_pdf(bytes: &[u8]) -> Option<String> {
    // pdf-extract can panic on malformed input
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match result {
        Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
        Ok(Ok(_)) => {
            tracing::debug!("PDF contains no extractable text");
            None
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "PDF text extraction failed");
            None
        }
        Err(_) => {
            tracing::warn!("PDF text extraction panicked");
            None
        }
    }
}

fn clip_to_char_boundary(mut text: String, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}
