//! Stable project key↔id mapping backed by a persisted assignment table.
//!
//! The workspace addresses Jira projects through numeric ids. Ids start at 100
//! and are handed out in discovery order, but once a Jira key has an id the
//! pair never changes — not across refreshes, not across restarts (the table
//! is persisted as JSON). Refreshes run single-flight: concurrent misses
//! coalesce into one upstream fetch.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use jira_api::JiraClient;

use crate::dto::Project;
use crate::error::{GatewayError, Result};

pub const FIRST_PROJECT_ID: u32 = 100;

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PersistedTable {
    next_id: u32,
    assignments: HashMap<String, u32>,
}

impl Default for PersistedTable {
    fn default() -> Self {
        Self {
            next_id: FIRST_PROJECT_ID,
            assignments: HashMap::new(),
        }
    }
}

/// File-backed storage for the assignment table. Read/parse errors fall back
/// to an empty table; write errors degrade the registry to in-memory only.
struct TableFile {
    path: PathBuf,
}

impl TableFile {
    fn load(&self) -> PersistedTable {
        if self.path.exists() {
            let content = fs::read_to_string(&self.path).unwrap_or_default();
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            PersistedTable::default()
        }
    }

    fn save(&self, table: &PersistedTable) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(table)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

struct RegistryInner {
    table: PersistedTable,
    snapshot: Vec<Project>,
}

/// Project mapping registry shared by all request handlers.
pub struct ProjectRegistry {
    file: Option<TableFile>,
    inner: Mutex<RegistryInner>,
    refresh_epoch: AtomicU64,
}

impl ProjectRegistry {
    pub fn new(path: Option<PathBuf>) -> Self {
        let file = path.map(|path| TableFile { path });
        let table = file
            .as_ref()
            .map(TableFile::load)
            .unwrap_or_default();
        if !table.assignments.is_empty() {
            tracing::info!(
                entries = table.assignments.len(),
                "loaded persisted project id table"
            );
        }
        Self {
            file,
            inner: Mutex::new(RegistryInner {
                table,
                snapshot: Vec::new(),
            }),
            refresh_epoch: AtomicU64::new(0),
        }
    }

    /// Fetches the Jira project list and assigns ids to keys not seen before.
    ///
    /// Callers that raced each other on a mapping miss share one fetch: a
    /// waiter that acquires the lock after another refresh completed returns
    /// that refresh's snapshot instead of hitting Jira again.
    pub async fn refresh(&self, client: &JiraClient) -> Result<Vec<Project>> {
        let observed = self.refresh_epoch.load(Ordering::Acquire);
        let mut inner = self.inner.lock().await;
        if self.refresh_epoch.load(Ordering::Acquire) != observed {
            return Ok(inner.snapshot.clone());
        }

        let fetched = client.list_projects().await?;
        let mut dirty = false;
        let mut projects = Vec::with_capacity(fetched.len());
        for raw in &fetched {
            let id = match inner.table.assignments.get(&raw.key) {
                Some(id) => *id,
                None => {
                    let id = inner.table.next_id;
                    inner.table.next_id += 1;
                    inner.table.assignments.insert(raw.key.clone(), id);
                    dirty = true;
                    id
                }
            };
            projects.push(Project::from_jira(raw, id));
        }
        if dirty {
            self.persist(&inner.table);
        }
        inner.snapshot = projects.clone();
        self.refresh_epoch.fetch_add(1, Ordering::Release);
        Ok(projects)
    }

    /// Id already assigned to a key, without touching Jira.
    pub async fn id_for_key(&self, key: &str) -> Option<u32> {
        self.inner.lock().await.table.assignments.get(key).copied()
    }

    /// Id for a key, assigning the next free one if the key is new.
    pub async fn assign_id(&self, key: &str) -> u32 {
        let mut inner = self.inner.lock().await;
        if let Some(id) = inner.table.assignments.get(key) {
            return *id;
        }
        let id = inner.table.next_id;
        inner.table.next_id += 1;
        inner.table.assignments.insert(key.to_string(), id);
        self.persist(&inner.table);
        id
    }

    /// Reverse lookup in the current table, without touching Jira.
    pub async fn key_for_id(&self, id: u32) -> Option<String> {
        self.inner
            .lock()
            .await
            .table
            .assignments
            .iter()
            .find(|(_, assigned)| **assigned == id)
            .map(|(key, _)| key.clone())
    }

    /// Three-tier id resolution: current table, then a refresh and retry, then
    /// a direct scan of the freshly fetched project list. Errs only when all
    /// three come up empty.
    pub async fn key_for_id_with_fallback(&self, client: &JiraClient, id: u32) -> Result<String> {
        if let Some(key) = self.key_for_id(id).await {
            return Ok(key);
        }
        tracing::debug!(project_id = id, "mapping miss, refreshing project table");
        // A failed rebuild counts as "no mapping available", not as an
        // upstream error: the caller still gets an answer naming the id.
        let refreshed = match self.refresh(client).await {
            Ok(projects) => projects,
            Err(err) => {
                tracing::warn!(error = %err, "project refresh failed during id resolution");
                Vec::new()
            }
        };
        if let Some(key) = self.key_for_id(id).await {
            return Ok(key);
        }
        refreshed
            .iter()
            .find(|project| project.id == id)
            .map(|project| project.jira_key.clone())
            .ok_or(GatewayError::UnknownProject(id))
    }

    /// Mapped project list from the last refresh.
    pub async fn snapshot(&self) -> Vec<Project> {
        self.inner.lock().await.snapshot.clone()
    }

    fn persist(&self, table: &PersistedTable) {
        let Some(file) = &self.file else {
            return;
        };
        if let Err(err) = file.save(table) {
            tracing::warn!(
                path = %file.path.display(),
                error = %err,
                "could not persist project id table, continuing in memory"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jira_api::JiraConfig;
    use serde_json::json;
    use std::time::Duration;

    fn test_client(server_url: &str) -> JiraClient {
        let config = JiraConfig::new(server_url, "bot@acme.io", "tok")
            .with_cooldown(Duration::ZERO);
        JiraClient::new(config).expect("client must build")
    }

    async fn mock_projects(server: &mut mockito::Server, projects: serde_json::Value) {
        server
            .mock("GET", "/rest/api/3/project/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "values": projects, "isLast": true }).to_string())
            .create_async()
            .await;
    }

    #[tokio::test]
    async fn ids_start_at_100_and_follow_discovery_order() {
        let mut server = mockito::Server::new_async().await;
        mock_projects(
            &mut server,
            json!([
                {"id": "1", "key": "DAW", "name": "Workspace"},
                {"id": "2", "key": "OPS", "name": "Operations"}
            ]),
        )
        .await;

        let registry = ProjectRegistry::new(None);
        let projects = registry.refresh(&test_client(&server.url())).await.unwrap();

        assert_eq!(projects[0].id, 100);
        assert_eq!(projects[1].id, 101);
    }

    #[tokio::test]
    async fn ids_are_stable_when_upstream_order_changes() {
        let registry = ProjectRegistry::new(None);

        let mut first = mockito::Server::new_async().await;
        mock_projects(
            &mut first,
            json!([
                {"id": "1", "key": "DAW", "name": "Workspace"},
                {"id": "2", "key": "OPS", "name": "Operations"}
            ]),
        )
        .await;
        registry.refresh(&test_client(&first.url())).await.unwrap();

        // Same projects, reversed order, plus a newcomer.
        let mut second = mockito::Server::new_async().await;
        mock_projects(
            &mut second,
            json!([
                {"id": "2", "key": "OPS", "name": "Operations"},
                {"id": "3", "key": "SEC", "name": "Security"},
                {"id": "1", "key": "DAW", "name": "Workspace"}
            ]),
        )
        .await;
        registry.refresh(&test_client(&second.url())).await.unwrap();

        assert_eq!(registry.id_for_key("DAW").await, Some(100));
        assert_eq!(registry.id_for_key("OPS").await, Some(101));
        assert_eq!(registry.id_for_key("SEC").await, Some(102));
    }

    #[tokio::test]
    async fn key_to_id_to_key_round_trips() {
        let mut server = mockito::Server::new_async().await;
        mock_projects(
            &mut server,
            json!([{"id": "1", "key": "DAW", "name": "Workspace"}]),
        )
        .await;

        let registry = ProjectRegistry::new(None);
        let client = test_client(&server.url());
        registry.refresh(&client).await.unwrap();

        let id = registry.id_for_key("DAW").await.expect("id assigned");
        let key = registry
            .key_for_id_with_fallback(&client, id)
            .await
            .expect("key resolves");
        assert_eq!(key, "DAW");
    }

    #[tokio::test]
    async fn unknown_id_errors_after_refresh_naming_the_id() {
        let mut server = mockito::Server::new_async().await;
        mock_projects(&mut server, json!([])).await;

        let registry = ProjectRegistry::new(None);
        let err = registry
            .key_for_id_with_fallback(&test_client(&server.url()), 999)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("999"));
    }

    #[tokio::test]
    async fn failed_rebuild_still_names_the_unresolved_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/3/project/search")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("upstream down")
            .create_async()
            .await;

        let registry = ProjectRegistry::new(None);
        let err = registry
            .key_for_id_with_fallback(&test_client(&server.url()), 123)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::UnknownProject(123)));
    }

    #[tokio::test]
    async fn assignments_survive_a_restart_via_the_table_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("registry/project-registry.json");

        let mut server = mockito::Server::new_async().await;
        mock_projects(
            &mut server,
            json!([
                {"id": "1", "key": "DAW", "name": "Workspace"},
                {"id": "2", "key": "OPS", "name": "Operations"}
            ]),
        )
        .await;

        let registry = ProjectRegistry::new(Some(path.clone()));
        registry.refresh(&test_client(&server.url())).await.unwrap();
        drop(registry);

        let revived = ProjectRegistry::new(Some(path));
        assert_eq!(revived.id_for_key("OPS").await, Some(101));
        // A fresh assignment continues the sequence instead of reusing ids.
        assert_eq!(revived.assign_id("NEW").await, 102);
    }

    #[tokio::test]
    async fn corrupt_table_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("project-registry.json");
        fs::write(&path, "not-json").expect("write corrupt file");

        let registry = ProjectRegistry::new(Some(path));
        assert_eq!(registry.assign_id("DAW").await, FIRST_PROJECT_ID);
    }
}
