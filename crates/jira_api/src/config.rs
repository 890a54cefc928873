use std::env;
use std::time::Duration;

use crate::error::{JiraError, Result};

pub const DEFAULT_USER_AGENT: &str = "daw-jira-gateway";
pub const DEFAULT_COOLDOWN_MS: u64 = 250;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const ENV_DOMAIN: &str = "JIRA_DOMAIN";
pub const ENV_EMAIL: &str = "JIRA_EMAIL";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";

/// Connection settings for a Jira Cloud site, authenticated with the
/// email + API token pair of a service account.
#[derive(Clone, Debug)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub user_agent: String,
    pub cooldown: Duration,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl JiraConfig {
    pub fn new(
        domain: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(&domain.into()),
            email: email.into(),
            api_token: api_token.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Reads `JIRA_DOMAIN`, `JIRA_EMAIL` and `JIRA_API_TOKEN` from the process
    /// environment. A missing or empty value is a configuration error; there is
    /// no local fallback when credentials are absent.
    pub fn from_env() -> Result<Self> {
        let domain = require_env(ENV_DOMAIN)?;
        let email = require_env(ENV_EMAIL)?;
        let api_token = require_env(ENV_API_TOKEN)?;
        Ok(Self::new(domain, email, api_token))
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn with_cooldown(mut self, duration: Duration) -> Self {
        self.cooldown = duration;
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Root of the core REST API (`/rest/api/3/`).
    pub fn rest_root(&self) -> String {
        format!("{}/rest/api/3/", self.base_url.trim_end_matches('/'))
    }

    /// Root of the Agile API (`/rest/agile/1.0/`).
    pub fn agile_root(&self) -> String {
        format!("{}/rest/agile/1.0/", self.base_url.trim_end_matches('/'))
    }
}

/// Accepts either a bare site domain (`acme.atlassian.net`) or a full URL.
fn normalize_base_url(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn require_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(JiraError::Config(format!("{name} is not set"))),
    }
}

#[cfg(test)]
mod tests {
    use super::JiraConfig;

    #[test]
    fn bare_domain_gets_https_scheme() {
        let config = JiraConfig::new("acme.atlassian.net", "bot@acme.io", "tok");
        assert_eq!(config.base_url, "https://acme.atlassian.net");
        assert_eq!(config.rest_root(), "https://acme.atlassian.net/rest/api/3/");
    }

    #[test]
    fn full_url_is_kept_verbatim() {
        let config = JiraConfig::new("https://jira.internal:8443/", "bot@acme.io", "tok");
        assert_eq!(config.base_url, "https://jira.internal:8443");
        assert_eq!(
            config.agile_root(),
            "https://jira.internal:8443/rest/agile/1.0/"
        );
    }
}
