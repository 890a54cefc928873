//! Error model used by Jira API client operations.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JiraError>;

/// Failure modes of a Jira API interaction: upstream HTTP errors with status
/// and decoded message, authentication rejections, timeouts, network and
/// serialization problems, missing configuration and everything else.
#[derive(Debug, Error)]
pub enum JiraError {
    #[error("jira returned {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl JiraError {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        JiraError::Http {
            status,
            message: message.into(),
        }
    }

    /// Upstream HTTP status when the error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            JiraError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for JiraError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JiraError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            JiraError::Http {
                status,
                message: err.to_string(),
            }
        } else if err.is_connect() {
            JiraError::Network(err.to_string())
        } else {
            JiraError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for JiraError {
    fn from(err: serde_json::Error) -> Self {
        JiraError::Serialization(err.to_string())
    }
}
