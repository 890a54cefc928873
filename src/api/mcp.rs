//! Legacy `/api/mcp/*` routes kept for older workspace screens.
//!
//! Same façades, different wire shape: flat `{success, …, error}` bodies
//! instead of the v1 envelope.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::dto::TaskCreatePayload;
use crate::error::GatewayError;

use super::envelope::ApiError;
use super::tasks::TaskListQuery;
use super::AppState;

/// Error rendered in the legacy flat shape.
pub struct McpError(ApiError);

impl From<ApiError> for McpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<GatewayError> for McpError {
    fn from(err: GatewayError) -> Self {
        Self(ApiError::from(err))
    }
}

impl IntoResponse for McpError {
    fn into_response(self) -> Response {
        (
            self.0.status,
            Json(json!({ "success": false, "error": self.0.message })),
        )
            .into_response()
    }
}

/// `GET /api/mcp/projects`
pub async fn projects(State(state): State<Arc<AppState>>) -> Result<Json<Value>, McpError> {
    let client = state.client().map_err(McpError::from)?;
    let projects = state.registry.refresh(client).await?;
    Ok(Json(json!({ "success": true, "projects": projects })))
}

/// `GET /api/mcp/tasks[?projectId=]`
pub async fn tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Value>, McpError> {
    let facade = state.tasks().map_err(McpError::from)?;
    let tasks = facade.list(query.project_id).await?;
    Ok(Json(json!({ "success": true, "tasks": tasks })))
}

/// `POST /api/mcp/tasks`
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TaskCreatePayload>,
) -> Result<(StatusCode, Json<Value>), McpError> {
    let facade = state.tasks().map_err(McpError::from)?;
    let task = facade.create(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "task": task })),
    ))
}
