//! Sprint façade over the Jira Agile API.

use serde_json::json;

use jira_api::JiraClient;

use crate::config::IssueFieldMap;
use crate::dto::{Board, Sprint, SprintCreatePayload, SprintState, SprintUpdatePayload};
use crate::error::Result;
use crate::vocab::{map_jira_status, TaskStatus};

#[derive(Clone)]
pub struct SprintFacade {
    client: JiraClient,
    fields: IssueFieldMap,
}

impl SprintFacade {
    pub fn new(client: JiraClient, fields: IssueFieldMap) -> Self {
        Self { client, fields }
    }

    pub async fn boards(&self) -> Result<Vec<Board>> {
        let boards = self.client.list_boards().await?;
        Ok(boards.iter().map(Board::from_jira).collect())
    }

    /// Sprints of a board. Point rollups stay at zero here; fetching them
    /// would cost one search per sprint.
    pub async fn list(&self, board_id: i64) -> Result<Vec<Sprint>> {
        let sprints = self.client.list_sprints(board_id).await?;
        Ok(sprints.iter().map(Sprint::from_jira).collect())
    }

    /// One sprint, with story points aggregated from its issues. The rollup is
    /// best-effort: a failed search leaves the totals at zero.
    pub async fn get(&self, sprint_id: i64) -> Result<Sprint> {
        let raw = self.client.get_sprint(sprint_id).await?;
        let mut sprint = Sprint::from_jira(&raw);

        let jql = format!("sprint = {sprint_id}");
        let fields = vec!["status".to_string(), self.fields.story_points.clone()];
        match self.client.search_issues(&jql, &fields, None).await {
            Ok(page) => {
                for issue in &page.issues {
                    let points = issue
                        .fields
                        .number_field(&self.fields.story_points)
                        .unwrap_or(0.0);
                    sprint.story_points += points;
                    let done = issue.fields.status.as_ref().is_some_and(|status| {
                        map_jira_status(
                            status.name.as_deref().unwrap_or_default(),
                            status
                                .status_category
                                .as_ref()
                                .and_then(|category| category.key.as_deref()),
                        ) == TaskStatus::Done
                    });
                    if done {
                        sprint.completed_points += points;
                    }
                }
                if sprint.state == SprintState::Closed {
                    sprint.velocity = sprint.completed_points;
                }
            }
            Err(err) => {
                tracing::warn!(sprint = sprint_id, error = %err, "story point rollup failed");
            }
        }

        Ok(sprint)
    }

    pub async fn create(&self, payload: &SprintCreatePayload) -> Result<Sprint> {
        let mut body = json!({
            "name": payload.name,
            "originBoardId": payload.board_id,
        });
        if let Some(goal) = &payload.goal {
            body["goal"] = json!(goal);
        }
        if let Some(start) = payload.start_date {
            body["startDate"] = json!(start.to_rfc3339());
        }
        if let Some(end) = payload.end_date {
            body["endDate"] = json!(end.to_rfc3339());
        }
        let created = self.client.create_sprint(&body).await?;
        tracing::info!(sprint = created.id, "created sprint");
        Ok(Sprint::from_jira(&created))
    }

    /// Partial update; only the provided fields are sent upstream.
    pub async fn update(&self, sprint_id: i64, payload: &SprintUpdatePayload) -> Result<Sprint> {
        let mut body = json!({});
        if let Some(name) = &payload.name {
            body["name"] = json!(name);
        }
        if let Some(goal) = &payload.goal {
            body["goal"] = json!(goal);
        }
        if let Some(state) = payload.state {
            body["state"] = json!(state.as_str());
        }
        if let Some(start) = payload.start_date {
            body["startDate"] = json!(start.to_rfc3339());
        }
        if let Some(end) = payload.end_date {
            body["endDate"] = json!(end.to_rfc3339());
        }
        let updated = self.client.update_sprint(sprint_id, &body).await?;
        Ok(Sprint::from_jira(&updated))
    }

    pub async fn delete(&self, sprint_id: i64) -> Result<()> {
        self.client.delete_sprint(sprint_id).await?;
        Ok(())
    }
}
