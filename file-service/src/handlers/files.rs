use crate::dtos::{FileResponse, FilesResponse, ListParams, OkResponse};
use crate::models::{FileRecord, FileType};
use crate::search::extract_text;
use crate::services::{apply_listing, Caller, FileFilter};
use crate::startup::AppState;
use crate::utils::{content_disposition, object_key};
use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use metrics::counter;
use service_core::error::AppError;

const UPLOAD_FIELD: &str = "files";

pub async fn upload_files(
    State(state): State<AppState>,
    caller: Caller,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut items = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let file_type = FileType::from_filename(&name)
            .filter(FileType::is_allowed)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unsupported file: {}", name)))?;

        let data = read_capped(&mut field, state.config.upload.max_file_bytes, &name).await?;
        let record = store_file(&state, &caller, name, file_type, data).await?;
        items.push(FileResponse::from(record));
    }

    if items.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("No files uploaded")));
    }

    Ok(Json(FilesResponse { items }))
}

/// Persist one upload: bytes first, then the metadata record.
///
/// A failed insert removes the bytes again so no orphan object is left.
async fn store_file(
    state: &AppState,
    caller: &Caller,
    name: String,
    file_type: FileType,
    data: Vec<u8>,
) -> Result<FileRecord, AppError> {
    let size = data.len() as u64;
    let key = object_key(&caller.uid, &name);

    let extracted_text = {
        let data = data.clone();
        let file_type = file_type.clone();
        tokio::task::spawn_blocking(move || extract_text(&data, &file_type))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Text extraction task failed");
                None
            })
    };

    state.storage.upload(&key, data).await.map_err(|e| {
        tracing::error!("Failed to upload file {} to storage: {}", key, e);
        e
    })?;

    let record = FileRecord::new(
        caller.uid.clone(),
        name,
        file_type,
        size,
        key,
        extracted_text,
    );

    if let Err(e) = state.repo.insert(&record).await {
        tracing::error!(file_id = %record.id, "Failed to insert file record: {}", e);
        if let Err(cleanup) = state.storage.delete(&record.object_key).await {
            tracing::error!(
                object_key = %record.object_key,
                "Failed to remove orphaned object: {}",
                cleanup
            );
        }
        return Err(e);
    }

    counter!("files_uploaded_total", "type" => record.file_type.as_str().to_string()).increment(1);
    tracing::info!(
        file_id = %record.id,
        uid = %record.uid,
        file_type = %record.file_type,
        size = record.size,
        searchable = record.extracted_text.is_some(),
        "File uploaded"
    );

    Ok(record)
}

async fn read_capped(
    field: &mut Field<'_>,
    limit: usize,
    name: &str,
) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if data.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(anyhow::anyhow!(
                "File too large: {} (max {} bytes)",
                name,
                limit
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(anyhow::anyhow!("Request body too large"))
    } else {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart body: {}", e))
    }
}

pub async fn list_files(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut filter = FileFilter::owned_by(&caller.uid);
    if let Some(ftype) = params.ftype.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        filter = filter.of_type(FileType::from(ftype.to_string()));
    }

    let records = state.repo.list(&filter).await?;
    let listed = apply_listing(records, &params);

    Ok(Json(listed.into_iter().collect::<FilesResponse>()))
}

pub async fn download_file(
    State(state): State<AppState>,
    caller: Caller,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .repo
        .get(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Not found")))?;

    if !record.is_owned_by(&caller.uid) && !caller.is_admin {
        return Err(AppError::Forbidden(anyhow::anyhow!("Forbidden")));
    }

    let data = state.storage.download(&record.object_key).await?;
    let disposition = HeaderValue::from_str(&content_disposition(&record.name))
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Invalid header value: {}", e)))?;

    tracing::info!(file_id = %record.id, uid = %caller.uid, size = data.len(), "File downloaded");

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        data,
    ))
}

/// Owner-only delete. The record goes first so the file disappears from
/// listings and search even if the object store delete fails.
pub async fn delete_file(
    State(state): State<AppState>,
    caller: Caller,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .repo
        .get(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Not found")))?;

    if !record.is_owned_by(&caller.uid) {
        return Err(AppError::Forbidden(anyhow::anyhow!("Only owner can delete")));
    }

    if !state.repo.delete(&record.id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Not found")));
    }

    if let Err(e) = state.storage.delete(&record.object_key).await {
        counter!("files_orphaned_total").increment(1);
        tracing::warn!(
            file_id = %record.id,
            object_key = %record.object_key,
            "Failed to delete stored object: {}",
            e
        );
    }

    tracing::info!(file_id = %record.id, uid = %caller.uid, "File deleted");

    Ok(Json(OkResponse::default()))
}
