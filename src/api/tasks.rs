use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::dto::{SubtaskCreatePayload, TaskCreatePayload, TaskUpdatePayload};

use super::envelope::{success, ApiError};
use super::AppState;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    #[serde(default)]
    pub project_id: Option<u32>,
}

#[derive(Deserialize)]
pub struct SubtaskListQuery {
    pub parent: String,
}

/// `GET /api/v1/jira/tasks[?projectId=]`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskListQuery>,
) -> Result<Response, ApiError> {
    let tasks = state.tasks()?.list(query.project_id).await?;
    Ok(success(StatusCode::OK, "Tâches synchronisées depuis Jira", tasks))
}

/// `POST /api/v1/jira/tasks`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TaskCreatePayload>,
) -> Result<Response, ApiError> {
    let task = state.tasks()?.create(&payload).await?;
    Ok(success(StatusCode::CREATED, "Tâche créée dans Jira", task))
}

/// `PUT /api/v1/jira/tasks/{key}` — returns the update outcome, warnings
/// included, instead of pretending partial failures succeeded.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(payload): Json<TaskUpdatePayload>,
) -> Result<Response, ApiError> {
    let outcome = state.tasks()?.update(&key, &payload).await?;
    let message = if outcome.warnings.is_empty() {
        "Tâche mise à jour"
    } else {
        "Tâche partiellement mise à jour"
    };
    Ok(success(StatusCode::OK, message, outcome))
}

/// `DELETE /api/v1/jira/tasks/{key}`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    state.tasks()?.delete(&key).await?;
    Ok(success(
        StatusCode::OK,
        "Tâche supprimée",
        serde_json::json!({ "deleted": key }),
    ))
}

/// `GET /api/v1/jira/subtasks?parent=KEY`
pub async fn list_subtasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubtaskListQuery>,
) -> Result<Response, ApiError> {
    let subtasks = state.tasks()?.list_subtasks(&query.parent).await?;
    Ok(success(StatusCode::OK, "Sous-tâches synchronisées", subtasks))
}

/// `POST /api/v1/jira/subtasks`
pub async fn create_subtask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubtaskCreatePayload>,
) -> Result<Response, ApiError> {
    let subtask = state.tasks()?.create_subtask(&payload).await?;
    Ok(success(StatusCode::CREATED, "Sous-tâche créée", subtask))
}
