//! Task CRUD façade: orchestrates Jira issue reads/writes through the project
//! registry and the vocabulary translator.

use std::sync::Arc;

use serde_json::{json, Value};

use jira_api::models::JiraTransition;
use jira_api::JiraClient;

use crate::config::IssueFieldMap;
use crate::dto::{SubtaskCreatePayload, Task, TaskCreatePayload, TaskUpdatePayload, UpdateOutcome};
use crate::error::Result;
use crate::registry::ProjectRegistry;
use crate::vocab::{jira_issue_type_name, map_jira_status, TaskStatus};

const SUBTASK_ISSUE_TYPE: &str = "Subtask";
const DEFAULT_ISSUE_TYPE_LABEL: &str = "Tâche";

#[derive(Clone)]
pub struct TaskFacade {
    client: JiraClient,
    registry: Arc<ProjectRegistry>,
    fields: IssueFieldMap,
}

impl TaskFacade {
    pub fn new(client: JiraClient, registry: Arc<ProjectRegistry>, fields: IssueFieldMap) -> Self {
        Self {
            client,
            registry,
            fields,
        }
    }

    /// Tasks across all projects, or scoped to one workspace project id.
    pub async fn list(&self, project_id: Option<u32>) -> Result<Vec<Task>> {
        let jql = match project_id {
            Some(id) => {
                let key = self
                    .registry
                    .key_for_id_with_fallback(&self.client, id)
                    .await?;
                format!("project = \"{key}\" ORDER BY updated DESC")
            }
            None => "ORDER BY updated DESC".to_string(),
        };
        self.search(&jql).await
    }

    /// Child issues of one parent, oldest first.
    pub async fn list_subtasks(&self, parent_key: &str) -> Result<Vec<Task>> {
        let jql = format!("parent = \"{parent_key}\" ORDER BY created ASC");
        self.search(&jql).await
    }

    async fn search(&self, jql: &str) -> Result<Vec<Task>> {
        let page = self
            .client
            .search_issues(jql, &self.issue_fields(), None)
            .await?;
        let mut tasks = Vec::with_capacity(page.issues.len());
        for issue in &page.issues {
            let project_id = match issue.fields.project.as_ref() {
                Some(project) => self.registry.assign_id(&project.key).await,
                None => {
                    tracing::warn!(issue = %issue.key, "issue without project field, mapping to 0");
                    0
                }
            };
            tasks.push(Task::from_issue(issue, project_id, &self.fields));
        }
        Ok(tasks)
    }

    /// Creates a Jira issue in the project mapped to `payload.project_id`.
    ///
    /// A mapping miss triggers the registry fallback chain; an id unknown even
    /// after a refresh rejects the create with an error naming that id.
    pub async fn create(&self, payload: &TaskCreatePayload) -> Result<Task> {
        let key = self
            .registry
            .key_for_id_with_fallback(&self.client, payload.project_id)
            .await?;

        let label = payload
            .issue_type
            .as_deref()
            .unwrap_or(DEFAULT_ISSUE_TYPE_LABEL);
        let mut fields = json!({
            "project": { "key": key },
            "summary": payload.title,
            "issuetype": { "name": jira_issue_type_name(label) },
        });
        if let Some(description) = &payload.description {
            fields["description"] = adf_document(description);
        }
        if let Some(priority) = payload.priority {
            fields["priority"] = json!({ "name": priority.jira_name() });
        }
        if let Some(due) = payload.due_date {
            fields["duedate"] = json!(due.to_string());
        }
        if !payload.labels.is_empty() {
            fields["labels"] = json!(payload.labels);
        }

        let created = self.client.create_issue(&fields).await?;
        tracing::info!(issue = %created.key, "created jira issue");
        let issue = self
            .client
            .get_issue(&created.key, &self.issue_fields())
            .await?;
        Ok(Task::from_issue(&issue, payload.project_id, &self.fields))
    }

    /// Creates a child issue under `payload.parent_key`. The project key is
    /// taken from the parent's key prefix.
    pub async fn create_subtask(&self, payload: &SubtaskCreatePayload) -> Result<Task> {
        let project_key = payload
            .parent_key
            .split('-')
            .next()
            .unwrap_or(&payload.parent_key);

        let mut fields = json!({
            "project": { "key": project_key },
            "parent": { "key": payload.parent_key },
            "summary": payload.title,
            "issuetype": { "name": SUBTASK_ISSUE_TYPE },
        });
        if let Some(description) = &payload.description {
            fields["description"] = adf_document(description);
        }
        if let Some(priority) = payload.priority {
            fields["priority"] = json!({ "name": priority.jira_name() });
        }

        let created = self.client.create_issue(&fields).await?;
        let issue = self
            .client
            .get_issue(&created.key, &self.issue_fields())
            .await?;
        let project_id = self.registry.assign_id(project_key).await;
        Ok(Task::from_issue(&issue, project_id, &self.fields))
    }

    /// Applies field edits, then — when a different target status is asked
    /// for — searches the issue's legal transitions for a match.
    ///
    /// The update never hard-fails on a partial problem: a failed field edit,
    /// a failed transition or an unmatched target status all end up as
    /// warnings in the returned outcome.
    pub async fn update(&self, issue_key: &str, payload: &TaskUpdatePayload) -> Result<UpdateOutcome> {
        let mut outcome = UpdateOutcome::default();

        let fields = build_update_fields(payload);
        if fields.as_object().is_some_and(|object| !object.is_empty()) {
            match self.client.update_issue(issue_key, &fields).await {
                Ok(()) => outcome.fields_updated = true,
                Err(err) => {
                    tracing::warn!(issue = issue_key, error = %err, "field update failed");
                    outcome
                        .warnings
                        .push(format!("la mise à jour des champs a échoué: {err}"));
                }
            }
        }

        if let Some(target) = payload.status {
            self.apply_transition(issue_key, target, &mut outcome).await;
        }

        Ok(outcome)
    }

    async fn apply_transition(
        &self,
        issue_key: &str,
        target: TaskStatus,
        outcome: &mut UpdateOutcome,
    ) {
        let current = match self.client.get_issue(issue_key, &status_fields()).await {
            Ok(issue) => issue.fields.status.as_ref().map(|status| {
                map_jira_status(
                    status.name.as_deref().unwrap_or_default(),
                    status
                        .status_category
                        .as_ref()
                        .and_then(|category| category.key.as_deref()),
                )
            }),
            Err(err) => {
                outcome
                    .warnings
                    .push(format!("impossible de lire le statut actuel: {err}"));
                None
            }
        };
        if current == Some(target) {
            return;
        }

        let transitions = match self.client.get_transitions(issue_key).await {
            Ok(transitions) => transitions,
            Err(err) => {
                outcome
                    .warnings
                    .push(format!("impossible de lister les transitions: {err}"));
                return;
            }
        };

        match select_transition(target, &transitions) {
            Some(transition) => match self
                .client
                .execute_transition(issue_key, &transition.id)
                .await
            {
                Ok(()) => outcome.transitioned = true,
                Err(err) => {
                    tracing::warn!(issue = issue_key, error = %err, "transition failed");
                    outcome.warnings.push(format!(
                        "la transition vers \"{}\" a échoué: {err}",
                        target.label()
                    ));
                }
            },
            None => {
                tracing::warn!(
                    issue = issue_key,
                    target = target.label(),
                    "no matching jira transition"
                );
                outcome.warnings.push(format!(
                    "aucune transition Jira ne mène au statut \"{}\"; statut inchangé",
                    target.label()
                ));
            }
        }
    }

    pub async fn delete(&self, issue_key: &str) -> Result<()> {
        self.client.delete_issue(issue_key, true).await?;
        Ok(())
    }

    fn issue_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = [
            "summary", "status", "priority", "issuetype", "assignee", "duedate", "labels",
            "project", "parent", "subtasks",
        ]
        .iter()
        .map(|field| field.to_string())
        .collect();
        fields.push(self.fields.story_points.clone());
        fields.push(self.fields.sprint.clone());
        fields
    }
}

fn status_fields() -> Vec<String> {
    vec!["status".to_string()]
}

fn build_update_fields(payload: &TaskUpdatePayload) -> Value {
    let mut fields = json!({});
    if let Some(title) = &payload.title {
        fields["summary"] = json!(title);
    }
    if let Some(description) = &payload.description {
        fields["description"] = adf_document(description);
    }
    if let Some(priority) = payload.priority {
        fields["priority"] = json!({ "name": priority.jira_name() });
    }
    if let Some(due) = payload.due_date {
        fields["duedate"] = json!(due.to_string());
    }
    if let Some(labels) = &payload.labels {
        fields["labels"] = json!(labels);
    }
    fields
}

/// Wraps plain text into a minimal Atlassian Document Format body.
fn adf_document(text: &str) -> Value {
    let content = if text.trim().is_empty() {
        json!([])
    } else {
        json!([{ "type": "text", "text": text }])
    };
    json!({
        "type": "doc",
        "version": 1,
        "content": [{ "type": "paragraph", "content": content }]
    })
}

/// Plausible Jira target-status names for each workspace status. Entries are
/// tried in order within each match strategy.
fn transition_targets(status: TaskStatus) -> &'static [&'static str] {
    match status {
        TaskStatus::Todo => &["To Do", "À faire", "Open", "Backlog", "Reopened"],
        TaskStatus::InProgress => &["In Progress", "En cours", "In Development", "Started"],
        TaskStatus::Waiting => &[
            "In Review",
            "En attente",
            "Waiting",
            "On Hold",
            "Blocked",
            "In Testing",
        ],
        TaskStatus::Done => &["Done", "Terminé", "Closed", "Resolved", "Complete"],
    }
}

/// Picks the transition that best reaches `target` from the issue's currently
/// legal transitions: exact target-status name match first, then bidirectional
/// substring containment on the target-status name, then substring containment
/// on the transition's own name. Returns `None` when nothing is plausible.
pub fn select_transition(
    target: TaskStatus,
    transitions: &[JiraTransition],
) -> Option<&JiraTransition> {
    let candidates = transition_targets(target);

    for candidate in candidates {
        let wanted = candidate.to_lowercase();
        if let Some(transition) = transitions.iter().find(|transition| {
            destination_name(transition).is_some_and(|name| name == wanted)
        }) {
            return Some(transition);
        }
    }

    for candidate in candidates {
        let wanted = candidate.to_lowercase();
        if let Some(transition) = transitions.iter().find(|transition| {
            destination_name(transition)
                .is_some_and(|name| name.contains(&wanted) || wanted.contains(&name))
        }) {
            return Some(transition);
        }
    }

    for candidate in candidates {
        let wanted = candidate.to_lowercase();
        if let Some(transition) = transitions.iter().find(|transition| {
            transition
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&wanted))
        }) {
            return Some(transition);
        }
    }

    None
}

fn destination_name(transition: &JiraTransition) -> Option<String> {
    transition
        .to
        .as_ref()
        .and_then(|to| to.name.as_deref())
        .map(str::to_lowercase)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::TaskUpdatePayload;
    use crate::vocab::TaskPriority;
    use serde_json::json;

    fn transition(id: &str, name: &str, to: Option<&str>) -> JiraTransition {
        serde_json::from_value(match to {
            Some(to) => json!({ "id": id, "name": name, "to": { "name": to } }),
            None => json!({ "id": id, "name": name }),
        })
        .expect("transition fixture")
    }

    #[test]
    fn exact_tier_matches_target_status_name() {
        let transitions = vec![
            transition("11", "Start work", Some("In Progress")),
            transition("31", "Close Issue", Some("Done")),
        ];
        let selected = select_transition(TaskStatus::Done, &transitions).expect("match");
        assert_eq!(selected.id, "31");
    }

    #[test]
    fn substring_tier_matches_when_exact_fails() {
        let transitions = vec![transition("41", "Wrap up", Some("Completed"))];
        let selected = select_transition(TaskStatus::Done, &transitions).expect("match");
        assert_eq!(selected.id, "41");
    }

    #[test]
    fn transition_name_tier_is_the_last_resort() {
        let transitions = vec![transition("51", "Move to Done", None)];
        let selected = select_transition(TaskStatus::Done, &transitions).expect("match");
        assert_eq!(selected.id, "51");
    }

    #[test]
    fn no_plausible_transition_returns_none() {
        let transitions = vec![
            transition("11", "Start work", Some("In Progress")),
            transition("21", "Pause", Some("On Hold")),
        ];
        assert!(select_transition(TaskStatus::Done, &transitions).is_none());
        assert!(select_transition(TaskStatus::Done, &[]).is_none());
    }

    #[test]
    fn exact_tier_outranks_substring_candidates_listed_earlier() {
        // "Terminé" sits before "Closed" in the table, but only "Closed" is an
        // exact destination here, so it must win over a fuzzy "Terminé" hit.
        let transitions = vec![
            transition("61", "Archive", Some("Terminé et archivé")),
            transition("62", "Close", Some("Closed")),
        ];
        let selected = select_transition(TaskStatus::Done, &transitions).expect("match");
        assert_eq!(selected.id, "62");
    }

    #[test]
    fn update_fields_builder_skips_absent_edits() {
        let payload = TaskUpdatePayload {
            title: Some("Nouveau titre".to_string()),
            priority: Some(TaskPriority::High),
            ..TaskUpdatePayload::default()
        };
        let fields = build_update_fields(&payload);
        assert_eq!(fields["summary"], json!("Nouveau titre"));
        assert_eq!(fields["priority"], json!({ "name": "High" }));
        assert!(fields.get("duedate").is_none());
        assert!(fields.get("description").is_none());

        let empty = build_update_fields(&TaskUpdatePayload::default());
        assert!(empty.as_object().unwrap().is_empty());
    }

    #[test]
    fn adf_document_wraps_text_and_tolerates_empty() {
        let doc = adf_document("Bonjour");
        assert_eq!(doc["type"], "doc");
        assert_eq!(doc["content"][0]["content"][0]["text"], json!("Bonjour"));

        let empty = adf_document("  ");
        assert_eq!(empty["content"][0]["content"], json!([]));
    }
}
