use crate::dtos::SearchParams;
use crate::search::{Scope, SearchLimits};
use crate::services::Caller;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn search_content(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;

    let scope = match params.scope.as_deref() {
        Some(scope) => scope.parse::<Scope>()?,
        None => Scope::Mine,
    };
    let limits = SearchLimits {
        max_results: params
            .max_results
            .unwrap_or(state.config.search.default_max_results),
        max_matches_per_file: params
            .max_matches_per_file
            .unwrap_or(state.config.search.max_matches_per_file),
    };

    let response = state
        .search
        .search(&caller, params.q.as_deref().unwrap_or_default(), scope, limits)
        .await?;

    Ok(Json(response))
}
