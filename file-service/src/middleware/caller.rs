use crate::services::Caller;
use crate::startup::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use service_core::error::AppError;

/// Bearer credential from the `Authorization` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticates the request with the configured identity verifier.
///
/// Every `/api` handler takes a `Caller`, so a missing or rejected token
/// short-circuits with 401 before any store is touched.
#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing bearer token")))?;

        let caller = state.identity.verify(token).await.map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            e
        })?;

        tracing::Span::current().record("user_id", caller.uid.as_str());

        Ok(caller)
    }
}
