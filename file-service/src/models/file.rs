use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declared type of an uploaded file, derived from its extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileType {
    /// `.txt`, searched as plain text.
    Txt,
    /// `.json`, searched as its raw serialized text.
    Json,
    /// `.pdf`, searched through best-effort text extraction.
    Pdf,
    /// Anything else. Never searchable.
    Other(String),
}

impl FileType {
    /// Types accepted by the upload endpoint.
    pub const ALLOWED_EXTENSIONS: [&'static str; 3] = ["json", "txt", "pdf"];

    /// Type of `filename` based on its last extension, if it has one.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (stem, ext) = filename.rsplit_once('.')?;
        if stem.is_empty() && ext.is_empty() {
            return None;
        }
        Some(Self::from(ext.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            FileType::Txt => "txt",
            FileType::Json => "json",
            FileType::Pdf => "pdf",
            FileType::Other(other) => other,
        }
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self, FileType::Other(_))
    }
}

impl From<String> for FileType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "txt" => FileType::Txt,
            "json" => FileType::Json,
            "pdf" => FileType::Pdf,
            other => FileType::Other(other.to_string()),
        }
    }
}

impl From<FileType> for String {
    fn from(value: FileType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one uploaded file, stored in the `files` collection.
///
/// Immutable after creation. `extracted_text` is computed once at upload and
/// only ever read by content search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub uid: String,
    pub name: String,
    pub name_lower: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub size: u64,
    pub object_key: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl FileRecord {
    pub fn new(
        uid: String,
        name: String,
        file_type: FileType,
        size: u64,
        object_key: String,
        extracted_text: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            uid,
            name_lower: name.to_lowercase(),
            name,
            file_type,
            size,
            object_key,
            created_at: Utc::now(),
            extracted_text,
        }
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.uid == uid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(FileType::from_filename("notes.TXT"), Some(FileType::Txt));
        assert_eq!(FileType::from_filename("a.b.json"), Some(FileType::Json));
        assert_eq!(FileType::from_filename("report.pdf"), Some(FileType::Pdf));
        assert_eq!(
            FileType::from_filename("evil.exe"),
            Some(FileType::Other("exe".to_string()))
        );
        assert_eq!(FileType::from_filename("README"), None);
    }

    #[test]
    fn test_only_closed_set_is_allowed() {
        assert!(FileType::Txt.is_allowed());
        assert!(FileType::Json.is_allowed());
        assert!(FileType::Pdf.is_allowed());
        assert!(!FileType::Other("docx".to_string()).is_allowed());
        assert!(!FileType::from_filename("archive.").unwrap().is_allowed());
    }

    #[test]
    fn test_file_type_serializes_as_bare_string() {
        assert_eq!(serde_json::to_string(&FileType::Pdf).unwrap(), "\"pdf\"");
        let parsed: FileType = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(parsed, FileType::Other("csv".to_string()));
    }

    #[test]
    fn test_new_record_lowercases_name() {
        let record = FileRecord::new(
            "user_uid".to_string(),
            "Quarterly Report.PDF".to_string(),
            FileType::Pdf,
            42,
            "users/user_uid/key".to_string(),
            None,
        );

        assert_eq!(record.name_lower, "quarterly report.pdf");
        assert!(record.is_owned_by("user_uid"));
        assert!(!record.is_owned_by("admin_uid"));
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_record_bson_roundtrip_keeps_type_key() {
        let record = FileRecord::new(
            "u".to_string(),
            "a.json".to_string(),
            FileType::Json,
            7,
            "users/u/a.json".to_string(),
            Some("{\"a\":1}".to_string()),
        );

        let doc = mongodb::bson::to_document(&record).unwrap();
        assert_eq!(doc.get_str("type").unwrap(), "json");
        assert_eq!(doc.get_str("_id").unwrap(), record.id);

        let back: FileRecord = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(back.file_type, FileType::Json);
        assert_eq!(back.extracted_text, record.extracted_text);
    }
}
