use crate::dtos::FilesResponse;
use crate::services::{Caller, FileFilter};
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

/// Every stored file, newest first.
pub async fn admin_list_files(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, AppError> {
    if !caller.is_admin {
        tracing::warn!(uid = %caller.uid, "Admin listing denied");
        return Err(AppError::Forbidden(anyhow::anyhow!("Admin only")));
    }

    let records = state.repo.list(&FileFilter::all()).await?;

    Ok(Json(records.into_iter().collect::<FilesResponse>()))
}
