//! Typed response contract for the `/api/v1` surface.
//!
//! Success and error bodies share one envelope shape:
//! `{status, message, data?, type, source}` where `source` names the upstream
//! (`jira` on success, `jira-error` on failure).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use jira_api::JiraError;

use crate::error::GatewayError;

pub const SOURCE_OK: &str = "jira";
pub const SOURCE_ERROR: &str = "jira-error";

#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub source: &'static str,
}

/// Successful v1 response with the given payload.
pub fn success<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> Response {
    let body = Envelope {
        status: status.as_u16(),
        message: message.into(),
        data: Some(data),
        kind: "SUCCESS",
        source: SOURCE_OK,
    };
    (status, Json(body)).into_response()
}

/// Error rendered as the v1 envelope by the `IntoResponse` impl.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The short-circuit answer when no Jira token is configured.
    pub fn missing_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "Jeton Jira absent: configurez JIRA_DOMAIN, JIRA_EMAIL et JIRA_API_TOKEN",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "api error");
        }
        let body = Envelope::<serde_json::Value> {
            status: self.status.as_u16(),
            message: self.message,
            data: None,
            kind: "ERROR",
            source: SOURCE_ERROR,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::UnknownProject(_) => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            GatewayError::Jira(jira) => jira.into(),
        }
    }
}

impl From<JiraError> for ApiError {
    fn from(err: JiraError) -> Self {
        match &err {
            JiraError::Config(_) => ApiError::missing_credentials(),
            JiraError::Auth(_) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "Jira a refusé les identifiants du service; vérifiez JIRA_EMAIL et JIRA_API_TOKEN",
            ),
            JiraError::Http { status, .. } => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, upstream_message(*status))
            }
            JiraError::Timeout(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Jira n'a pas répondu dans le délai imparti",
            ),
            JiraError::Network(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Jira est injoignable pour le moment",
            ),
            JiraError::Serialization(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Jira a renvoyé une réponse inattendue",
            ),
            JiraError::Other(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

/// Human message picked from the upstream status class.
fn upstream_message(status: StatusCode) -> String {
    if status == StatusCode::NOT_FOUND {
        "L'objet demandé n'existe plus sur Jira".to_string()
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        "Jira limite le débit des requêtes; réessayez dans un instant".to_string()
    } else if status == StatusCode::BAD_REQUEST {
        "Jira a rejeté le contenu de la requête".to_string()
    } else if status.is_server_error() {
        "Jira est momentanément indisponible".to_string()
    } else {
        format!("Erreur Jira inattendue ({status})")
    }
}
