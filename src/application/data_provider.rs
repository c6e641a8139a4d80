// Read-only data shared by every indicator of one dashboard render
use crate::application::error::ServiceError;
use crate::application::gantt_service::{load_current_issues, load_team, GanttOptions, Period};
use crate::application::tracker_repository::TrackerRepository;
use crate::domain::calendar::WorkCalendar;
use crate::domain::issue::{Issue, UserId};
use crate::domain::status::StatusCatalog;
use crate::domain::team::{Team, UserDirectory};
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct PluginDataProvider {
    pub team: Team,
    pub user_id: UserId,
    pub period: Period,
    pub reference_date: NaiveDate,
    pub users: UserDirectory,
    /// Resolved over at least `period`, wider when an indicator asked for it
    pub resolved_issues: Vec<Issue>,
    /// Open issues in scheduling order
    pub current_issues: Vec<Issue>,
    pub statuses: StatusCatalog,
    pub calendar: WorkCalendar,
    pub gantt: GanttOptions,
}

/// Shared configuration needed to build a provider.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub statuses: StatusCatalog,
    pub calendar: WorkCalendar,
    pub gantt: GanttOptions,
}

impl PluginDataProvider {
    /// `resolved_window` bounds the resolved issues to load, `None` loads all of them.
    pub async fn load(
        repository: &dyn TrackerRepository,
        context: &ProviderContext,
        team_id: u32,
        user_id: UserId,
        period: Period,
        resolved_window: Option<Period>,
        reference_date: NaiveDate,
    ) -> Result<Self, ServiceError> {
        let team = load_team(repository, team_id).await?;
        let users = UserDirectory::new(repository.team_members(team_id).await?);
        let (start, end) = match resolved_window {
            Some(window) => (window.start, window.end),
            None => (DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC),
        };
        let resolved_issues = repository.resolved_issues(team_id, start, end).await?;
        let current_issues = load_current_issues(repository, &team).await?;

        Ok(Self {
            team,
            user_id,
            period,
            reference_date,
            users,
            resolved_issues,
            current_issues,
            statuses: context.statuses.clone(),
            calendar: context.calendar.clone(),
            gantt: context.gantt.clone(),
        })
    }

    /// Loaded resolved issues whose resolution falls in `period`, all of them for `None`
    pub fn resolved_within(&self, period: Option<Period>) -> impl Iterator<Item = &Issue> {
        let threshold = self.statuses.resolved_threshold;
        self.resolved_issues.iter().filter(move |issue| match period {
            None => true,
            Some(period) => issue
                .latest_occurrence_at_or_above(threshold)
                .is_some_and(|at| period.contains(at)),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_provider(
    resolved_issues: Vec<Issue>,
    current_issues: Vec<Issue>,
    reference_date: NaiveDate,
) -> PluginDataProvider {
    use crate::domain::team::User;

    PluginDataProvider {
        team: Team {
            id: 1,
            name: "core".to_string(),
            members: vec![7, 8],
        },
        user_id: 7,
        period: Period::resolve(None, None, reference_date).unwrap(),
        reference_date,
        users: UserDirectory::new(vec![
            User {
                id: 7,
                name: "alice".to_string(),
            },
            User {
                id: 8,
                name: "bob".to_string(),
            },
        ]),
        resolved_issues,
        current_issues,
        statuses: crate::domain::status::mantis_catalog(),
        calendar: WorkCalendar::default(),
        gantt: GanttOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::issue::{change, test_issue};

    #[test]
    fn test_resolved_within() {
        let mut recent = test_issue(1, 7, "2024-01-02T00:00:00Z");
        recent.history = vec![change(80, "2024-01-05T00:00:00Z")];
        let mut old = test_issue(2, 7, "2023-06-01T00:00:00Z");
        old.history = vec![change(90, "2023-06-03T00:00:00Z")];
        let provider = test_provider(
            vec![recent, old],
            Vec::new(),
            NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
        );

        let in_period: Vec<_> = provider
            .resolved_within(Some(provider.period))
            .map(|i| i.id)
            .collect();
        assert_eq!(in_period, vec![1]);
        assert_eq!(provider.resolved_within(None).count(), 2);
    }
}
