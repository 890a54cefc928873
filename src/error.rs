use jira_api::JiraError;
use thiserror::Error;

/// Errors surfaced by the gateway façades.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("aucun projet Jira n'est associé à l'identifiant {0}")]
    UnknownProject(u32),
    #[error(transparent)]
    Jira(#[from] JiraError),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
