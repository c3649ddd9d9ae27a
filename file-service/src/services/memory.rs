use crate::models::FileRecord;
use crate::services::database::{FileFilter, FileRepository};
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local metadata store, selected with `METADATA_BACKEND=memory`.
#[derive(Default)]
pub struct InMemoryFileRepository {
    files: RwLock<HashMap<String, FileRecord>>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
        let mut files = self.files.write().await;
        if files.contains_key(&record.id) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "duplicate file id {}",
                record.id
            )));
        }
        files.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FileRecord>, AppError> {
        Ok(self.files.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.files.write().await.remove(id).is_some())
    }

    async fn list(&self, filter: &FileFilter) -> Result<Vec<FileRecord>, AppError> {
        let files = self.files.read().await;
        let mut records: Vec<FileRecord> = files
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .map(|mut record| {
                if !filter.with_text {
                    record.extracted_text = None;
                }
                record
            })
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
