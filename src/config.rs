//! Gateway process configuration, read from the environment.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 4000;

pub const ENV_BIND: &str = "DAW_BIND";
pub const ENV_PORT: &str = "DAW_PORT";
pub const ENV_REGISTRY_PATH: &str = "DAW_REGISTRY_PATH";
pub const ENV_STORY_POINTS_FIELD: &str = "JIRA_STORY_POINTS_FIELD";
pub const ENV_SPRINT_FIELD: &str = "JIRA_SPRINT_FIELD";

const DEFAULT_STORY_POINTS_FIELD: &str = "customfield_10016";
const DEFAULT_SPRINT_FIELD: &str = "customfield_10020";

/// Server settings plus the custom-field ids that vary per Jira installation.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
    pub registry_path: Option<PathBuf>,
    pub fields: IssueFieldMap,
}

/// Installation-specific custom-field ids used when reading issues.
#[derive(Clone, Debug)]
pub struct IssueFieldMap {
    pub story_points: String,
    pub sprint: String,
}

impl Default for IssueFieldMap {
    fn default() -> Self {
        Self {
            story_points: DEFAULT_STORY_POINTS_FIELD.to_string(),
            sprint: DEFAULT_SPRINT_FIELD.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            bind: env_or(ENV_BIND, DEFAULT_BIND),
            port: env::var(ENV_PORT)
                .ok()
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            registry_path: env::var(ENV_REGISTRY_PATH).ok().map(PathBuf::from),
            fields: IssueFieldMap {
                story_points: env_or(ENV_STORY_POINTS_FIELD, DEFAULT_STORY_POINTS_FIELD),
                sprint: env_or(ENV_SPRINT_FIELD, DEFAULT_SPRINT_FIELD),
            },
        }
    }

    /// Registry file location: explicit override, else the platform config dir.
    pub fn resolved_registry_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.registry_path {
            return Some(path.clone());
        }
        directories::ProjectDirs::from("io", "daw", "jira-gateway")
            .map(|dirs| dirs.config_dir().join("project-registry.json"))
    }
}

fn env_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}
