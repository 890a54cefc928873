use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::dto::{SprintCreatePayload, SprintUpdatePayload};

use super::envelope::{success, ApiError};
use super::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintListQuery {
    pub board_id: i64,
}

/// `GET /api/v1/jira/boards`
pub async fn boards(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let boards = state.sprints()?.boards().await?;
    Ok(success(StatusCode::OK, "Tableaux synchronisés", boards))
}

/// `GET /api/v1/jira/sprints?boardId=`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SprintListQuery>,
) -> Result<Response, ApiError> {
    let sprints = state.sprints()?.list(query.board_id).await?;
    Ok(success(StatusCode::OK, "Sprints synchronisés", sprints))
}

/// `GET /api/v1/jira/sprints/{id}` — includes the story point rollup.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let sprint = state.sprints()?.get(id).await?;
    Ok(success(StatusCode::OK, "Sprint synchronisé", sprint))
}

/// `POST /api/v1/jira/sprints`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SprintCreatePayload>,
) -> Result<Response, ApiError> {
    let sprint = state.sprints()?.create(&payload).await?;
    Ok(success(StatusCode::CREATED, "Sprint créé", sprint))
}

/// `PUT /api/v1/jira/sprints/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<SprintUpdatePayload>,
) -> Result<Response, ApiError> {
    let sprint = state.sprints()?.update(id, &payload).await?;
    Ok(success(StatusCode::OK, "Sprint mis à jour", sprint))
}

/// `DELETE /api/v1/jira/sprints/{id}`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.sprints()?.delete(id).await?;
    Ok(success(
        StatusCode::OK,
        "Sprint supprimé",
        serde_json::json!({ "deleted": id }),
    ))
}
