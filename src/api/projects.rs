use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use super::envelope::{success, ApiError};
use super::AppState;

/// `GET /api/v1/jira/projects` — mapped project list, refreshed from Jira.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let client = state.client()?;
    let projects = state.registry.refresh(client).await.map_err(ApiError::from)?;
    Ok(success(
        StatusCode::OK,
        "Projets synchronisés depuis Jira",
        projects,
    ))
}
