// Repository trait for issue tracker data access
use crate::domain::issue::{Issue, UserId};
use crate::domain::team::{Team, TeamId, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TrackerRepository: Send + Sync {
    async fn team(&self, team_id: TeamId) -> anyhow::Result<Option<Team>>;

    /// Members of a team with their display names
    async fn team_members(&self, team_id: TeamId) -> anyhow::Result<Vec<User>>;

    /// Issues of the team's members that reached the resolved threshold within [start, end]
    async fn resolved_issues(
        &self,
        team_id: TeamId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Issue>>;

    /// Issues assigned to a user and not yet resolved
    async fn assigned_issues(&self, user_id: UserId) -> anyhow::Result<Vec<Issue>>;
}
