//! Translation between Jira's free-text vocabulary and the workspace's own
//! status/priority/issue-type labels.
//!
//! The mapping functions are total: every input maps to exactly one local
//! value, unknown inputs fall back to a default.

use serde::{Deserialize, Serialize};

/// Workspace task status. Wire values are the UI's French labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "À faire")]
    Todo,
    #[serde(rename = "En cours")]
    InProgress,
    #[serde(rename = "En attente")]
    Waiting,
    #[serde(rename = "Terminé")]
    Done,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "À faire",
            TaskStatus::InProgress => "En cours",
            TaskStatus::Waiting => "En attente",
            TaskStatus::Done => "Terminé",
        }
    }
}

/// Workspace task priority. Wire values are the UI's French labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPriority {
    #[serde(rename = "Faible")]
    Low,
    #[serde(rename = "Moyenne")]
    Medium,
    #[serde(rename = "Élevée")]
    High,
    #[serde(rename = "Critique")]
    Critical,
}

impl TaskPriority {
    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Faible",
            TaskPriority::Medium => "Moyenne",
            TaskPriority::High => "Élevée",
            TaskPriority::Critical => "Critique",
        }
    }

    /// Jira priority name used when writing issues.
    pub fn jira_name(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Critical => "Highest",
        }
    }
}

/// Maps a Jira status to the workspace status.
///
/// A recognized status category short-circuits; otherwise substring heuristics
/// run against the raw name in fixed precedence (done, then review/waiting,
/// then todo, then in-progress). Statuses can match several tiers at once, so
/// the order is load-bearing.
pub fn map_jira_status(name: &str, category_key: Option<&str>) -> TaskStatus {
    match category_key.map(str::trim) {
        Some("done") => return TaskStatus::Done,
        Some("new") => return TaskStatus::Todo,
        Some("indeterminate") => return TaskStatus::InProgress,
        _ => {}
    }

    let name = name.to_lowercase();
    const DONE: &[&str] = &["done", "terminé", "termine", "closed", "resolved", "fermé"];
    const WAITING: &[&str] = &[
        "review", "test", "valid", "attente", "wait", "blocked", "bloqué", "hold", "qa",
    ];
    const TODO: &[&str] = &["to do", "todo", "à faire", "a faire", "backlog", "open", "ouvert"];
    const IN_PROGRESS: &[&str] = &["progress", "cours", "dev", "doing"];

    if DONE.iter().any(|needle| name.contains(needle)) {
        TaskStatus::Done
    } else if WAITING.iter().any(|needle| name.contains(needle)) {
        TaskStatus::Waiting
    } else if TODO.iter().any(|needle| name.contains(needle)) {
        TaskStatus::Todo
    } else if IN_PROGRESS.iter().any(|needle| name.contains(needle)) {
        TaskStatus::InProgress
    } else {
        TaskStatus::Todo
    }
}

/// Maps a Jira priority name to the workspace priority. Unknown names fall
/// back to Moyenne. The Critique tier runs first so "Highest" does not get
/// caught by the "high" substring.
pub fn map_jira_priority(name: &str) -> TaskPriority {
    let name = name.to_lowercase();
    const CRITICAL: &[&str] = &["highest", "critical", "blocker", "urgent", "critique"];
    const HIGH: &[&str] = &["high", "major", "élevée", "elevee"];
    const LOW: &[&str] = &["lowest", "low", "minor", "trivial", "faible"];

    if CRITICAL.iter().any(|needle| name.contains(needle)) {
        TaskPriority::Critical
    } else if HIGH.iter().any(|needle| name.contains(needle)) {
        TaskPriority::High
    } else if LOW.iter().any(|needle| name.contains(needle)) {
        TaskPriority::Low
    } else {
        TaskPriority::Medium
    }
}

/// Normalizes a Jira issue type name to the workspace label.
pub fn map_jira_issue_type(name: &str) -> &'static str {
    let name = name.to_lowercase();
    if name.contains("sub") || name.contains("sous") {
        "Sous-tâche"
    } else if name.contains("bug") || name.contains("defect") || name.contains("anomalie") {
        "Bug"
    } else if name.contains("story") || name.contains("récit") {
        "Story"
    } else if name.contains("epic") {
        "Epic"
    } else {
        "Tâche"
    }
}

/// Jira issue type name used when creating issues from a workspace label.
pub fn jira_issue_type_name(label: &str) -> &str {
    match label.trim() {
        "Tâche" | "" => "Task",
        "Sous-tâche" => "Subtask",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_category_short_circuits() {
        assert_eq!(map_jira_status("anything", Some("done")), TaskStatus::Done);
        assert_eq!(map_jira_status("anything", Some("new")), TaskStatus::Todo);
        assert_eq!(
            map_jira_status("anything", Some("indeterminate")),
            TaskStatus::InProgress
        );
    }

    #[test]
    fn status_precedence_holds_when_multiple_substrings_match() {
        // "In Review Progress" matches both the review and the progress tiers;
        // review outranks progress.
        assert_eq!(
            map_jira_status("In Review Progress", None),
            TaskStatus::Waiting
        );
        // "Done In Progress" would be absurd upstream but must still resolve
        // deterministically to the done tier.
        assert_eq!(map_jira_status("Done In Progress", None), TaskStatus::Done);
    }

    #[test]
    fn status_tiers_map_to_expected_labels() {
        assert_eq!(map_jira_status("Closed", None), TaskStatus::Done);
        assert_eq!(map_jira_status("In Testing", None), TaskStatus::Waiting);
        assert_eq!(map_jira_status("Selected for Development", None), TaskStatus::InProgress);
        assert_eq!(map_jira_status("Backlog", None), TaskStatus::Todo);
        assert_eq!(map_jira_status("In Progress", None), TaskStatus::InProgress);
    }

    #[test]
    fn status_is_total_with_todo_default() {
        assert_eq!(map_jira_status("", None), TaskStatus::Todo);
        assert_eq!(map_jira_status("🦀", None), TaskStatus::Todo);
        assert_eq!(map_jira_status("Triage", Some("weird-category")), TaskStatus::Todo);
    }

    #[test]
    fn priority_highest_wins_over_high_substring() {
        assert_eq!(map_jira_priority("Highest"), TaskPriority::Critical);
        assert_eq!(map_jira_priority("High"), TaskPriority::High);
    }

    #[test]
    fn priority_is_total_with_medium_default() {
        assert_eq!(map_jira_priority("Medium"), TaskPriority::Medium);
        assert_eq!(map_jira_priority(""), TaskPriority::Medium);
        assert_eq!(map_jira_priority("P3 - whatever"), TaskPriority::Medium);
    }

    #[test]
    fn priority_tiers() {
        assert_eq!(map_jira_priority("Blocker"), TaskPriority::Critical);
        assert_eq!(map_jira_priority("Major"), TaskPriority::High);
        assert_eq!(map_jira_priority("Lowest"), TaskPriority::Low);
        assert_eq!(map_jira_priority("Trivial"), TaskPriority::Low);
    }

    #[test]
    fn issue_type_round_trips_common_labels() {
        assert_eq!(map_jira_issue_type("Sub-task"), "Sous-tâche");
        assert_eq!(map_jira_issue_type("Bug"), "Bug");
        assert_eq!(map_jira_issue_type("User Story"), "Story");
        assert_eq!(map_jira_issue_type("Epic"), "Epic");
        assert_eq!(map_jira_issue_type("Task"), "Tâche");
        assert_eq!(jira_issue_type_name("Tâche"), "Task");
        assert_eq!(jira_issue_type_name("Sous-tâche"), "Subtask");
        assert_eq!(jira_issue_type_name("Bug"), "Bug");
    }

    #[test]
    fn wire_values_are_the_french_labels() {
        let json = serde_json::to_string(&TaskStatus::Done).unwrap();
        assert_eq!(json, "\"Terminé\"");
        let parsed: TaskPriority = serde_json::from_str("\"Élevée\"").unwrap();
        assert_eq!(parsed, TaskPriority::High);
    }
}
