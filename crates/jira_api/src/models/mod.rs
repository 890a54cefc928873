mod board;
mod issue;
mod project;
mod search;
mod sprint;
mod transition;
mod user;

pub use board::{BoardPage, JiraBoard};
pub use issue::{
    IssueFields, IssueStatus, IssueType, JiraIssue, NamedRef, ParentRef, ProjectRef, StatusCategory,
    SubtaskRef,
};
pub use project::{JiraProject, ProjectPage};
pub use search::SearchPage;
pub use sprint::{JiraSprint, SprintPage};
pub use transition::{JiraTransition, TransitionList, TransitionTarget};
pub use user::JiraUser;
