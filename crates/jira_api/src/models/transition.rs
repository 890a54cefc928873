use serde::Deserialize;

/// A workflow transition currently legal for an issue.
#[derive(Debug, Deserialize, Clone)]
pub struct JiraTransition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub to: Option<TransitionTarget>,
}

/// Target status a transition moves the issue into.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransitionTarget {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status_category: Option<super::issue::StatusCategory>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransitionList {
    #[serde(default)]
    pub transitions: Vec<JiraTransition>,
}
