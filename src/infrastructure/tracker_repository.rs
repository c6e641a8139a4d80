// File-backed issue tracker repository implementation
use crate::application::tracker_repository::TrackerRepository;
use crate::domain::issue::{Issue, UserId};
use crate::domain::status::StatusCatalog;
use crate::domain::team::{Team, TeamId, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// Snapshot of the tracker tables this service reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerDocument {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone)]
pub struct FileTrackerRepository {
    document: TrackerDocument,
    statuses: StatusCatalog,
}

impl FileTrackerRepository {
    pub fn from_document(document: TrackerDocument, statuses: StatusCatalog) -> Self {
        Self { document, statuses }
    }

    pub fn load(path: impl AsRef<Path>, statuses: StatusCatalog) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tracker data from {}", path.display()))?;
        let document: TrackerDocument = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse tracker data in {}", path.display()))?;

        tracing::info!(
            "Loaded tracker data: {} teams, {} users, {} issues",
            document.teams.len(),
            document.users.len(),
            document.issues.len()
        );

        Ok(Self::from_document(document, statuses))
    }

    fn find_team(&self, team_id: TeamId) -> Option<&Team> {
        self.document.teams.iter().find(|t| t.id == team_id)
    }
}

#[async_trait]
impl TrackerRepository for FileTrackerRepository {
    async fn team(&self, team_id: TeamId) -> Result<Option<Team>> {
        Ok(self.find_team(team_id).cloned())
    }

    async fn team_members(&self, team_id: TeamId) -> Result<Vec<User>> {
        let Some(team) = self.find_team(team_id) else {
            return Ok(Vec::new());
        };

        Ok(self
            .document
            .users
            .iter()
            .filter(|u| team.members.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn resolved_issues(
        &self,
        team_id: TeamId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Issue>> {
        let Some(team) = self.find_team(team_id) else {
            return Ok(Vec::new());
        };

        let threshold = self.statuses.resolved_threshold;
        Ok(self
            .document
            .issues
            .iter()
            .filter(|i| team.members.contains(&i.handler_id))
            .filter(|i| self.statuses.is_resolved(i.status))
            .filter(|i| {
                i.latest_occurrence_at_or_above(threshold)
                    .is_some_and(|at| start <= at && at <= end)
            })
            .cloned()
            .collect())
    }

    async fn assigned_issues(&self, user_id: UserId) -> Result<Vec<Issue>> {
        Ok(self
            .document
            .issues
            .iter()
            .filter(|i| i.handler_id == user_id && !self.statuses.is_resolved(i.status))
            .cloned()
            .collect())
    }
}
