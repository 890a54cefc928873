//! HTTP surface of the gateway: router, shared state and the credential gate.

pub mod envelope;
mod mcp;
mod projects;
mod sprints;
mod tasks;

use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use jira_api::{JiraClient, JiraConfig};

use crate::config::IssueFieldMap;
use crate::registry::ProjectRegistry;
use crate::sprints::SprintFacade;
use crate::tasks::TaskFacade;
use envelope::ApiError;

/// Shared application state. `jira` is `None` when the credential triple is
/// absent from the environment; every `/api/*` route then answers 401.
pub struct AppState {
    jira: Option<JiraClient>,
    pub registry: Arc<ProjectRegistry>,
    fields: IssueFieldMap,
}

impl AppState {
    pub fn new(
        jira: Option<JiraClient>,
        registry: Arc<ProjectRegistry>,
        fields: IssueFieldMap,
    ) -> Arc<Self> {
        Arc::new(Self {
            jira,
            registry,
            fields,
        })
    }

    /// Builds state from the process environment. Missing credentials are not
    /// fatal at startup; the surface degrades to 401s.
    pub fn from_env(registry: Arc<ProjectRegistry>, fields: IssueFieldMap) -> Arc<Self> {
        let jira = match JiraConfig::from_env() {
            Ok(config) => match JiraClient::new(config) {
                Ok(client) => Some(client),
                Err(err) => {
                    tracing::warn!(error = %err, "could not build jira client");
                    None
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "jira access disabled");
                None
            }
        };
        Self::new(jira, registry, fields)
    }

    pub fn client(&self) -> Result<&JiraClient, ApiError> {
        self.jira.as_ref().ok_or_else(ApiError::missing_credentials)
    }

    pub fn tasks(&self) -> Result<TaskFacade, ApiError> {
        Ok(TaskFacade::new(
            self.client()?.clone(),
            self.registry.clone(),
            self.fields.clone(),
        ))
    }

    pub fn sprints(&self) -> Result<SprintFacade, ApiError> {
        Ok(SprintFacade::new(self.client()?.clone(), self.fields.clone()))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/jira/projects", get(projects::list))
        .route(
            "/api/v1/jira/tasks",
            get(tasks::list).post(tasks::create),
        )
        .route(
            "/api/v1/jira/tasks/{key}",
            axum::routing::put(tasks::update).delete(tasks::remove),
        )
        .route(
            "/api/v1/jira/subtasks",
            get(tasks::list_subtasks).post(tasks::create_subtask),
        )
        .route(
            "/api/v1/jira/subtasks/{key}",
            axum::routing::put(tasks::update).delete(tasks::remove),
        )
        .route("/api/v1/jira/boards", get(sprints::boards))
        .route(
            "/api/v1/jira/sprints",
            get(sprints::list).post(sprints::create),
        )
        .route(
            "/api/v1/jira/sprints/{id}",
            get(sprints::detail)
                .put(sprints::update)
                .delete(sprints::remove),
        )
        .route("/api/mcp/projects", get(mcp::projects))
        .route("/api/mcp/tasks", get(mcp::tasks).post(mcp::create_task))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            credential_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "daw-jira-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Short-circuits every `/api/*` route with 401 when no token is configured.
/// Legacy `/api/mcp/*` routes keep their flat error shape.
async fn credential_gate(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if state.jira.is_none() && path.starts_with("/api/") {
        let error = ApiError::missing_credentials();
        if path.starts_with("/api/mcp/") {
            return mcp::McpError::from(error).into_response();
        }
        return error.into_response();
    }
    next.run(request).await
}
