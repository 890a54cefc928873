//! Workspace-facing payload shapes and their conversions from Jira models.
//!
//! These are the JSON bodies exchanged with the workspace UI; field names are
//! camelCase on the wire, statuses and priorities carry the French labels.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use jira_api::models::{JiraBoard, JiraProject, JiraSprint};
use jira_api::JiraIssue;

use crate::config::IssueFieldMap;
use crate::vocab::{
    map_jira_issue_type, map_jira_priority, map_jira_status, TaskPriority, TaskStatus,
};

/// A Jira project as the workspace sees it: stable numeric id plus the Jira
/// coordinates it maps to.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u32,
    pub jira_key: String,
    pub jira_id: String,
    pub title: String,
    pub board_type: BoardType,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardType {
    Scrum,
    Kanban,
    Support,
}

impl Project {
    pub fn from_jira(raw: &JiraProject, id: u32) -> Self {
        Self {
            id,
            jira_key: raw.key.clone(),
            jira_id: raw.id.clone(),
            title: raw.name.clone(),
            board_type: board_type_for(raw.project_type_key.as_deref()),
        }
    }
}

/// Service-desk projects surface as Support boards, software as Scrum,
/// everything else (business, unknown) as Kanban.
fn board_type_for(project_type_key: Option<&str>) -> BoardType {
    match project_type_key.map(str::trim) {
        Some("software") => BoardType::Scrum,
        Some("service_desk") => BoardType::Support,
        _ => BoardType::Kanban,
    }
}

/// A Jira issue translated into the workspace task model.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub project_id: u32,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub jira_key: String,
    pub jira_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint: Option<String>,
    pub is_subtask: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    pub has_subtasks: bool,
}

impl Task {
    pub fn from_issue(issue: &JiraIssue, project_id: u32, fields: &IssueFieldMap) -> Self {
        let f = &issue.fields;
        let status = f
            .status
            .as_ref()
            .map(|status| {
                map_jira_status(
                    status.name.as_deref().unwrap_or_default(),
                    status
                        .status_category
                        .as_ref()
                        .and_then(|category| category.key.as_deref()),
                )
            })
            .unwrap_or(TaskStatus::Todo);
        let priority = f
            .priority
            .as_ref()
            .and_then(|priority| priority.name.as_deref())
            .map(map_jira_priority)
            .unwrap_or(TaskPriority::Medium);

        Self {
            id: issue.id.parse().unwrap_or(0),
            project_id,
            title: f.summary.clone().unwrap_or_default(),
            status,
            priority,
            assignee: f
                .assignee
                .as_ref()
                .and_then(|user| user.display_name.clone()),
            due_date: f
                .duedate
                .as_deref()
                .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()),
            jira_key: issue.key.clone(),
            jira_id: issue.id.clone(),
            issue_type: f
                .issuetype
                .as_ref()
                .and_then(|kind| kind.name.as_deref())
                .map(|name| map_jira_issue_type(name).to_string()),
            story_points: f.number_field(&fields.story_points),
            labels: f.labels.clone(),
            sprint: f.raw_field(&fields.sprint).and_then(sprint_name_from_field),
            is_subtask: f.issuetype.as_ref().map(|kind| kind.subtask).unwrap_or(false),
            parent_key: f.parent.as_ref().map(|parent| parent.key.clone()),
            has_subtasks: !f.subtasks.is_empty(),
        }
    }
}

/// Extracts a sprint name from the sprint custom field, which Jira returns
/// either as objects, as legacy `...[...,name=Sprint 5,...]` strings, or as an
/// array of either. The most recent entry wins.
pub fn sprint_name_from_field(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().rev().find_map(sprint_name_from_field),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::String(text) => text
            .trim_end_matches(']')
            .split(',')
            .find_map(|part| part.trim().strip_prefix("name=").map(str::to_string)),
        _ => None,
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreatePayload {
    pub project_id: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdatePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskCreatePayload {
    pub parent_key: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

/// What actually happened during a task update. Field edits and the status
/// transition are separate upstream calls; either can fail without aborting
/// the other, and everything partial lands in `warnings`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub fields_updated: bool,
    pub transitioned: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub state: SprintState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub story_points: f64,
    pub completed_points: f64,
    pub velocity: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
    Future,
    Active,
    Closed,
}

impl SprintState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintState::Future => "future",
            SprintState::Active => "active",
            SprintState::Closed => "closed",
        }
    }
}

impl Sprint {
    pub fn from_jira(raw: &JiraSprint) -> Self {
        Self {
            id: raw.id,
            name: raw.name.clone().unwrap_or_default(),
            goal: raw.goal.clone().filter(|goal| !goal.is_empty()),
            state: match raw.state.as_deref() {
                Some("active") => SprintState::Active,
                Some("closed") => SprintState::Closed,
                _ => SprintState::Future,
            },
            start_date: raw.start_date.as_deref().and_then(parse_jira_datetime),
            end_date: raw.end_date.as_deref().and_then(parse_jira_datetime),
            story_points: 0.0,
            completed_points: 0.0,
            velocity: 0.0,
        }
    }
}

fn parse_jira_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SprintCreatePayload {
    pub board_id: i64,
    pub name: String,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SprintUpdatePayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub state: Option<SprintState>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_type: Option<String>,
}

impl Board {
    pub fn from_jira(raw: &JiraBoard) -> Self {
        Self {
            id: raw.id,
            name: raw.name.clone().unwrap_or_default(),
            board_type: raw.board_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sprint_name_extraction_handles_all_field_shapes() {
        let objects = json!([
            {"id": 7, "name": "Sprint 7", "state": "closed"},
            {"id": 8, "name": "Sprint 8", "state": "active"}
        ]);
        assert_eq!(sprint_name_from_field(&objects).as_deref(), Some("Sprint 8"));

        let legacy = json!(
            "com.atlassian.greenhopper.service.sprint.Sprint@1f[id=5,state=ACTIVE,name=Sprint 5,goal=]"
        );
        assert_eq!(sprint_name_from_field(&legacy).as_deref(), Some("Sprint 5"));

        assert_eq!(sprint_name_from_field(&json!(null)), None);
        assert_eq!(sprint_name_from_field(&json!([])), None);
    }

    #[test]
    fn board_type_heuristic() {
        assert_eq!(board_type_for(Some("software")), BoardType::Scrum);
        assert_eq!(board_type_for(Some("service_desk")), BoardType::Support);
        assert_eq!(board_type_for(Some("business")), BoardType::Kanban);
        assert_eq!(board_type_for(None), BoardType::Kanban);
    }

    #[test]
    fn sprint_conversion_parses_dates_and_state() {
        let raw: JiraSprint = serde_json::from_value(json!({
            "id": 12,
            "name": "Sprint 12",
            "state": "closed",
            "startDate": "2026-07-01T09:00:00.000Z",
            "endDate": "2026-07-15T17:00:00.000Z"
        }))
        .unwrap();

        let sprint = Sprint::from_jira(&raw);
        assert_eq!(sprint.state, SprintState::Closed);
        assert!(sprint.start_date.is_some());
        assert!(sprint.end_date.unwrap() > sprint.start_date.unwrap());
    }

    #[test]
    fn task_conversion_maps_vocabulary_and_linkage() {
        let issue: JiraIssue = serde_json::from_value(json!({
            "id": "10500",
            "key": "DAW-17",
            "fields": {
                "summary": "Réviser les accès",
                "status": {"name": "In Review", "statusCategory": {"key": "indeterminate"}},
                "priority": {"name": "Highest"},
                "issuetype": {"name": "Sub-task", "subtask": true},
                "assignee": {"displayName": "Sam Untel"},
                "duedate": "2026-09-01",
                "labels": ["securite"],
                "project": {"id": "10000", "key": "DAW", "name": "D&A Workspace"},
                "parent": {"key": "DAW-10"},
                "customfield_10016": 3.0
            }
        }))
        .unwrap();

        let task = Task::from_issue(&issue, 100, &IssueFieldMap::default());
        assert_eq!(task.id, 10500);
        assert_eq!(task.project_id, 100);
        // category key wins over the name heuristics
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, TaskPriority::Critical);
        assert_eq!(task.issue_type.as_deref(), Some("Sous-tâche"));
        assert_eq!(task.story_points, Some(3.0));
        assert!(task.is_subtask);
        assert_eq!(task.parent_key.as_deref(), Some("DAW-10"));
        assert_eq!(task.due_date.unwrap().to_string(), "2026-09-01");
    }
}
