use crate::models::{FileRecord, FileType};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

/// Selection of file records for listing and search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    /// Restrict to one owner; `None` selects every user's files.
    pub owner: Option<String>,
    pub file_type: Option<FileType>,
    /// Load `extracted_text` as well. Only search needs it.
    pub with_text: bool,
}

impl FileFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn owned_by(uid: &str) -> Self {
        Self {
            owner: Some(uid.to_string()),
            ..Self::default()
        }
    }

    pub fn of_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn with_text(mut self) -> Self {
        self.with_text = true;
        self
    }

    pub fn matches(&self, record: &FileRecord) -> bool {
        self.owner.as_deref().is_none_or(|uid| record.uid == uid)
            && self
                .file_type
                .as_ref()
                .is_none_or(|file_type| &record.file_type == file_type)
    }

    fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(uid) = &self.owner {
            filter.insert("uid", uid);
        }
        if let Some(file_type) = &self.file_type {
            filter.insert("type", file_type.as_str());
        }
        filter
    }
}

/// Metadata store for file records.
///
/// `list` returns records newest first.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError>;
    async fn get(&self, id: &str) -> Result<Option<FileRecord>, AppError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
    async fn list(&self, filter: &FileFilter) -> Result<Vec<FileRecord>, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for file-service");

        let files = self.files();

        let owner_index = IndexModel::builder()
            .keys(doc! { "uid": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("owner_recent_lookup".to_string())
                    .build(),
            )
            .build();

        files.create_index(owner_index, None).await.map_err(|e| {
            tracing::error!("Failed to create owner index on files collection: {}", e);
            AppError::from(e)
        })?;
        tracing::info!("Created index on files.(uid, created_at)");

        let recent_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("recent_lookup".to_string())
                    .build(),
            )
            .build();

        files.create_index(recent_index, None).await.map_err(|e| {
            tracing::error!("Failed to create recency index on files collection: {}", e);
            AppError::from(e)
        })?;
        tracing::info!("Created index on files.created_at");

        Ok(())
    }

    pub fn files(&self) -> Collection<FileRecord> {
        self.db.collection("files")
    }
}

#[async_trait]
impl FileRepository for MongoDb {
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
        self.files().insert_one(record, None).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FileRecord>, AppError> {
        Ok(self.files().find_one(doc! { "_id": id }, None).await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.files().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list(&self, filter: &FileFilter) -> Result<Vec<FileRecord>, AppError> {
        let projection = (!filter.with_text).then(|| doc! { "extracted_text": 0 });
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .projection(projection)
            .build();

        let cursor = self.files().find(filter.to_document(), options).await?;
        let records: Vec<FileRecord> = cursor.try_collect().await?;
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
