use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::user::JiraUser;

#[derive(Debug, Deserialize, Clone)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

/// Issue fields requested via the `fields` search parameter. Custom fields
/// (story points, sprint) land in `extra` keyed by their `customfield_*` id.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub priority: Option<NamedRef>,
    #[serde(default)]
    pub issuetype: Option<IssueType>,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
    #[serde(default)]
    pub duedate: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskRef>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IssueStatus {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status_category: Option<StatusCategory>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusCategory {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssueType {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subtask: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectRef {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParentRef {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubtaskRef {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
}

impl IssueFields {
    /// Numeric value of a custom field, e.g. story points.
    pub fn number_field(&self, field_id: &str) -> Option<f64> {
        self.extra.get(field_id).and_then(Value::as_f64)
    }

    /// Raw value of a custom field.
    pub fn raw_field(&self, field_id: &str) -> Option<&Value> {
        self.extra.get(field_id)
    }
}
