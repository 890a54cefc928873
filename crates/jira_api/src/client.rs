use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::JiraConfig;
use crate::error::{JiraError, Result};
use crate::models::{
    JiraIssue, JiraProject, JiraSprint, JiraTransition, JiraUser, ProjectPage, SearchPage,
    SprintPage, TransitionList,
};
use crate::pacing::RequestPacer;

const PROJECT_PAGE_SIZE: u32 = 100;
const SPRINT_PAGE_SIZE: u32 = 50;

/// Async client for the Jira Cloud REST API v3 and Agile API 1.0.
///
/// Authenticates every request with HTTP Basic (`email:api_token`) and paces
/// upstream calls through a shared [`RequestPacer`].
#[derive(Clone)]
pub struct JiraClient {
    http: HttpClient,
    config: JiraConfig,
    pacer: RequestPacer,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        let pacer = RequestPacer::new(config.cooldown);
        Self::new_with_pacer(config, pacer)
    }

    pub fn new_with_pacer(config: JiraConfig, pacer: RequestPacer) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self {
            http,
            config,
            pacer,
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }

    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(Method::GET, self.rest_url(path), &[], Option::<&Value>::None)
            .await
    }

    pub async fn get_with_query<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(Method::GET, self.rest_url(path), query, Option::<&Value>::None)
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, self.rest_url(path), &[], Some(body))
            .await
    }

    pub async fn put_expect_empty<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send_expect_empty(Method::PUT, self.rest_url(path), &[], Some(body))
            .await
    }

    pub async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<()> {
        self.send_expect_empty(Method::DELETE, self.rest_url(path), query, None::<&Value>)
            .await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        url: String,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.dispatch(method, url, query, body).await?;
        self.parse_json(response).await
    }

    async fn send_expect_empty<B>(
        &self,
        method: Method,
        url: String,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.dispatch(method, url, query, body).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.error_from_response(status, response).await)
        }
    }

    async fn dispatch<B>(
        &self,
        method: Method,
        url: String,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.pacer.acquire().await;
        let mut request = self.http.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }
        Ok(request.send().await?)
    }

    fn rest_url(&self, path: &str) -> String {
        let mut url = self.config.rest_root();
        url.push_str(path.trim_start_matches('/'));
        url
    }

    fn agile_url(&self, path: &str) -> String {
        let mut url = self.config.agile_root();
        url.push_str(path.trim_start_matches('/'));
        url
    }

    async fn parse_json<T>(&self, response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(JiraError::from)
        } else {
            Err(self.error_from_response(status, response).await)
        }
    }

    async fn error_from_response(&self, status: StatusCode, response: Response) -> JiraError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(wait) = retry_after(response.headers()) {
                tracing::warn!(wait_secs = wait.as_secs(), "jira rate limit hit, backing off");
                self.pacer.penalize(wait).await;
            }
        }
        let body = response.text().await.unwrap_or_default();
        let message = decode_error_body(&body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            JiraError::Auth(format!("access denied ({status}): {message}"))
        } else {
            JiraError::http(status, message)
        }
    }

    // ---- core REST operations ----

    /// Profile of the authenticated account; used to validate credentials.
    pub async fn get_myself(&self) -> Result<JiraUser> {
        self.get("myself").await
    }

    /// Full project list, following `project/search` pagination.
    pub async fn list_projects(&self) -> Result<Vec<JiraProject>> {
        let mut projects = Vec::new();
        let mut start_at: u64 = 0;
        loop {
            let page_size = PROJECT_PAGE_SIZE.to_string();
            let start = start_at.to_string();
            let page: ProjectPage = self
                .get_with_query(
                    "project/search",
                    &[("startAt", start.as_str()), ("maxResults", page_size.as_str())],
                )
                .await?;
            let fetched = page.values.len() as u64;
            projects.extend(page.values);
            if fetched == 0 || page.is_last.unwrap_or(true) {
                break;
            }
            start_at += fetched;
        }
        Ok(projects)
    }

    /// Single page of JQL results with the given issue fields expanded.
    pub async fn search_issues(
        &self,
        jql: &str,
        fields: &[String],
        max_results: Option<u32>,
    ) -> Result<SearchPage> {
        let max_results = max_results.unwrap_or(100).clamp(1, 100).to_string();
        let fields = fields.join(",");
        self.get_with_query(
            "search",
            &[
                ("jql", jql),
                ("maxResults", max_results.as_str()),
                ("fields", fields.as_str()),
            ],
        )
        .await
    }

    pub async fn get_issue(&self, issue_key: &str, fields: &[String]) -> Result<JiraIssue> {
        let path = format!("issue/{issue_key}");
        let fields = fields.join(",");
        self.get_with_query(&path, &[("fields", fields.as_str())]).await
    }

    /// Creates an issue from a `fields` object and returns its id/key.
    pub async fn create_issue(&self, fields: &Value) -> Result<CreatedIssue> {
        self.post("issue", &json!({ "fields": fields })).await
    }

    /// Applies a partial `fields` edit to an issue.
    pub async fn update_issue(&self, issue_key: &str, fields: &Value) -> Result<()> {
        let path = format!("issue/{issue_key}");
        self.put_expect_empty(&path, &json!({ "fields": fields })).await
    }

    pub async fn delete_issue(&self, issue_key: &str, delete_subtasks: bool) -> Result<()> {
        let path = format!("issue/{issue_key}");
        let flag = if delete_subtasks { "true" } else { "false" };
        self.delete(&path, &[("deleteSubtasks", flag)]).await
    }

    /// Transitions currently legal for the issue.
    pub async fn get_transitions(&self, issue_key: &str) -> Result<Vec<JiraTransition>> {
        let path = format!("issue/{issue_key}/transitions");
        let list: TransitionList = self.get(&path).await?;
        Ok(list.transitions)
    }

    pub async fn execute_transition(&self, issue_key: &str, transition_id: &str) -> Result<()> {
        let path = format!("issue/{issue_key}/transitions");
        let payload = json!({ "transition": { "id": transition_id } });
        self.send_expect_empty(Method::POST, self.rest_url(&path), &[], Some(&payload))
            .await
    }

    // ---- Agile API operations ----

    /// Boards visible to the account, following pagination.
    pub async fn list_boards(&self) -> Result<Vec<crate::models::JiraBoard>> {
        let mut boards = Vec::new();
        let mut start_at: u64 = 0;
        loop {
            let start = start_at.to_string();
            let page_size = SPRINT_PAGE_SIZE.to_string();
            let page: crate::models::BoardPage = self
                .send(
                    Method::GET,
                    self.agile_url("board"),
                    &[("startAt", start.as_str()), ("maxResults", page_size.as_str())],
                    Option::<&Value>::None,
                )
                .await?;
            let fetched = page.values.len() as u64;
            boards.extend(page.values);
            if fetched == 0 || page.is_last.unwrap_or(true) {
                break;
            }
            start_at += fetched;
        }
        Ok(boards)
    }

    /// All sprints of a board, following pagination.
    pub async fn list_sprints(&self, board_id: i64) -> Result<Vec<JiraSprint>> {
        let mut sprints = Vec::new();
        let mut start_at: u64 = 0;
        loop {
            let start = start_at.to_string();
            let page_size = SPRINT_PAGE_SIZE.to_string();
            let page: SprintPage = self
                .send(
                    Method::GET,
                    self.agile_url(&format!("board/{board_id}/sprint")),
                    &[("startAt", start.as_str()), ("maxResults", page_size.as_str())],
                    Option::<&Value>::None,
                )
                .await?;
            let fetched = page.values.len() as u64;
            sprints.extend(page.values);
            if fetched == 0 || page.is_last.unwrap_or(true) {
                break;
            }
            start_at += fetched;
        }
        Ok(sprints)
    }

    pub async fn get_sprint(&self, sprint_id: i64) -> Result<JiraSprint> {
        self.send(
            Method::GET,
            self.agile_url(&format!("sprint/{sprint_id}")),
            &[],
            Option::<&Value>::None,
        )
        .await
    }

    pub async fn create_sprint(&self, payload: &Value) -> Result<JiraSprint> {
        self.send(Method::POST, self.agile_url("sprint"), &[], Some(payload))
            .await
    }

    /// Partial sprint update (Agile API uses POST for partial edits).
    pub async fn update_sprint(&self, sprint_id: i64, payload: &Value) -> Result<JiraSprint> {
        self.send(
            Method::POST,
            self.agile_url(&format!("sprint/{sprint_id}")),
            &[],
            Some(payload),
        )
        .await
    }

    pub async fn delete_sprint(&self, sprint_id: i64) -> Result<()> {
        self.send_expect_empty(
            Method::DELETE,
            self.agile_url(&format!("sprint/{sprint_id}")),
            &[],
            None::<&Value>,
        )
        .await
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}

fn build_http_client(config: &JiraConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    let credentials = BASE64_STANDARD.encode(format!("{}:{}", config.email, config.api_token));
    let mut auth_value = header_value(format!("Basic {credentials}"))?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);
    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| JiraError::Other(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|err| JiraError::Other(err.to_string()))
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Flattens Jira's `{"errorMessages": [...], "errors": {...}}` body into one
/// human-readable line, falling back to the raw (truncated) body.
fn decode_error_body(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    if let Some(value) = parsed {
        let mut parts: Vec<String> = Vec::new();
        if let Some(messages) = value.get("errorMessages").and_then(Value::as_array) {
            parts.extend(messages.iter().filter_map(Value::as_str).map(String::from));
        }
        if let Some(errors) = value.get("errors").and_then(Value::as_object) {
            parts.extend(
                errors
                    .iter()
                    .filter_map(|(field, msg)| msg.as_str().map(|m| format!("{field}: {m}"))),
            );
        }
        if !parts.is_empty() {
            return parts.join("; ");
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error details provided".to_string()
    } else {
        let mut message: String = trimmed.chars().take(200).collect();
        if message.len() < trimmed.len() {
            message.push('…');
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn test_config(server_url: &str) -> JiraConfig {
        JiraConfig::new(server_url, "bot@acme.io", "secret-token")
            .with_cooldown(Duration::ZERO)
    }

    #[tokio::test]
    async fn sends_basic_auth_and_user_agent_headers() {
        let mut server = mockito::Server::new_async().await;
        let expected = format!(
            "Basic {}",
            BASE64_STANDARD.encode("bot@acme.io:secret-token")
        );
        let mock = server
            .mock("GET", "/rest/api/3/myself")
            .match_header("authorization", expected.as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"displayName":"Bot"}"#)
            .create_async()
            .await;

        let client = JiraClient::new(test_config(&server.url())).unwrap();
        let user = client.get_myself().await.unwrap();

        mock.assert_async().await;
        assert_eq!(user.display_name.as_deref(), Some("Bot"));
    }

    #[tokio::test]
    async fn list_projects_follows_pagination() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/3/project/search")
            .match_query(Matcher::UrlEncoded("startAt".into(), "0".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "values": [
                        {"id": "10000", "key": "DAW", "name": "D&A Workspace"},
                        {"id": "10001", "key": "OPS", "name": "Operations"}
                    ],
                    "isLast": false
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/rest/api/3/project/search")
            .match_query(Matcher::UrlEncoded("startAt".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "values": [{"id": "10002", "key": "SEC", "name": "Security"}],
                    "isLast": true
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = JiraClient::new(test_config(&server.url())).unwrap();
        let projects = client.list_projects().await.unwrap();

        let keys: Vec<&str> = projects.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["DAW", "OPS", "SEC"]);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/3/myself")
            .with_status(401)
            .with_body(r#"{"errorMessages":["Basic auth failed"]}"#)
            .create_async()
            .await;

        let client = JiraClient::new(test_config(&server.url())).unwrap();
        let err = client.get_myself().await.unwrap_err();

        match err {
            JiraError::Auth(message) => assert!(message.contains("Basic auth failed")),
            other => panic!("expected Auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_body_is_decoded_into_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex(r"^/rest/api/3/issue/DAW-9$".into()))
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"errorMessages":["Issue does not exist or you do not have permission to see it."]}"#)
            .create_async()
            .await;

        let client = JiraClient::new(test_config(&server.url())).unwrap();
        let err = client.get_issue("DAW-9", &[]).await.unwrap_err();

        match err {
            JiraError::Http { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(message.contains("Issue does not exist"));
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_issue_wraps_fields_object() {
        let mut server = mockito::Server::new_async().await;
        let fields = json!({
            "project": {"key": "DAW"},
            "summary": "Provision staging",
            "issuetype": {"name": "Task"}
        });
        let mock = server
            .mock("POST", "/rest/api/3/issue")
            .match_body(Matcher::Json(json!({ "fields": fields })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"10042","key":"DAW-42"}"#)
            .create_async()
            .await;

        let client = JiraClient::new(test_config(&server.url())).unwrap();
        let created = client.create_issue(&fields).await.unwrap();

        mock.assert_async().await;
        assert_eq!(created.key, "DAW-42");
    }

    #[tokio::test]
    async fn execute_transition_posts_id_and_accepts_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/3/issue/DAW-7/transitions")
            .match_body(Matcher::Json(json!({"transition": {"id": "31"}})))
            .with_status(204)
            .create_async()
            .await;

        let client = JiraClient::new(test_config(&server.url())).unwrap();
        client.execute_transition("DAW-7", "31").await.unwrap();

        mock.assert_async().await;
    }
}
