use crate::models::FileRecord;
use serde::{Deserialize, Serialize};

/// Wire form of a [`FileRecord`]. Extracted text stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: String,
    pub uid: String,
    pub name: String,
    pub name_lower: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: u64,
    pub object_key: String,
    pub created_at: String,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            uid: record.uid,
            name: record.name,
            name_lower: record.name_lower,
            file_type: record.file_type.into(),
            size: record.size,
            object_key: record.object_key,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FilesResponse {
    pub items: Vec<FileResponse>,
}

impl FromIterator<FileRecord> for FilesResponse {
    fn from_iter<T: IntoIterator<Item = FileRecord>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().map(FileResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl Default for OkResponse {
    fn default() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query parameters of `GET /api/files`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
    /// Exact file type, e.g. `pdf`.
    pub ftype: Option<String>,
    /// Case-insensitive filename substring.
    pub q: Option<String>,
}
