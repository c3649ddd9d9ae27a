use crate::dtos::{ListParams, SortKey, SortOrder};
use crate::models::{FileRecord, FileType};

/// Filter and order `records` for display.
///
/// Pure function of its inputs. `ftype` is an exact type match, `q` a
/// case-insensitive filename substring. Sorting is stable, so ties keep the
/// incoming order.
pub fn apply_listing(records: Vec<FileRecord>, params: &ListParams) -> Vec<FileRecord> {
    let file_type = params
        .ftype
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| FileType::from(t.to_string()));
    let needle = params
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut records: Vec<FileRecord> = records
        .into_iter()
        .filter(|r| file_type.as_ref().is_none_or(|t| &r.file_type == t))
        .filter(|r| needle.as_deref().is_none_or(|q| r.name_lower.contains(q)))
        .collect();

    records.sort_by(|a, b| {
        let ordering = match params.sort {
            SortKey::Date => a.created_at.cmp(&b.created_at),
            SortKey::Size => a.size.cmp(&b.size),
        };
        match params.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    records
}
