//! Typed Jira Cloud REST client crate used by the gateway service.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pacing;

pub use client::{CreatedIssue, JiraClient};
pub use config::JiraConfig;
pub use error::{JiraError, Result};
pub use models::{
    IssueFields, IssueStatus, IssueType, JiraBoard, JiraIssue, JiraProject, JiraSprint, JiraUser,
    JiraTransition, SearchPage, StatusCategory, TransitionTarget,
};
pub use pacing::RequestPacer;
