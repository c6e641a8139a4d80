// Gantt service - Derives per-user task timelines from tracker data
use crate::application::error::ServiceError;
use crate::application::tracker_repository::TrackerRepository;
use crate::domain::calendar::WorkCalendar;
use crate::domain::gantt::{
    Activity, ActivityType, GanttGraph, GanttRow, ScaleHeader, Timeline,
};
use crate::domain::issue::Issue;
use crate::domain::status::StatusCatalog;
use crate::domain::team::{Team, TeamId, UserDirectory};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;

const CHART_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_PERIOD_DAYS: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct GanttOptions {
    /// Display color for activities of already resolved issues
    pub resolved_color: Option<String>,
}

/// Reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    /// Missing bounds default to the month before `reference` and the end of `reference`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        reference: NaiveDate,
    ) -> Result<Self, ServiceError> {
        let start = start.unwrap_or_else(|| {
            reference
                .checked_sub_days(Days::new(DEFAULT_PERIOD_DAYS))
                .unwrap_or(reference)
        });
        let end = end.unwrap_or(reference);
        if end < start {
            return Err(ServiceError::InvalidRequest(format!(
                "period end {} is before start {}",
                end, start
            )));
        }
        Ok(Self {
            start: start_of_day(start),
            end: end_of_day(end),
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Smallest period covering both
    pub fn union(self, other: Period) -> Period {
        Period {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.succ_opt()
        .map(|next| start_of_day(next) - chrono::Duration::seconds(1))
        .unwrap_or_else(|| start_of_day(date))
}

/// Dispatches issues into a per-user timeline.
pub struct GanttManager<'a> {
    statuses: &'a StatusCatalog,
    calendar: &'a WorkCalendar,
    options: &'a GanttOptions,
    timeline: Timeline,
}

impl<'a> GanttManager<'a> {
    pub fn new(
        statuses: &'a StatusCatalog,
        calendar: &'a WorkCalendar,
        options: &'a GanttOptions,
    ) -> Self {
        Self {
            statuses,
            calendar,
            options,
            timeline: Timeline::new(),
        }
    }

    fn start_date(&self, issue: &Issue) -> DateTime<Utc> {
        issue
            .first_status_occurrence(self.statuses.acknowledged)
            .unwrap_or(issue.submitted_at)
    }

    /// Resolved issues have known bounds: first acknowledgement (or submission)
    /// to the latest transition at or above the resolved threshold.
    pub fn dispatch_resolved<'i>(&mut self, issues: impl IntoIterator<Item = &'i Issue>) {
        for issue in issues {
            let start = self.start_date(issue);
            let end = issue
                .latest_occurrence_at_or_above(self.statuses.resolved_threshold)
                .or_else(|| issue.latest_status_occurrence(self.statuses.closed));

            if end.is_none() {
                tracing::debug!("Resolved issue {} has no resolution date", issue.id);
            }

            let mut activity = Activity::new(issue.id, issue.handler_id, start, end, 1.0);
            if let Some(color) = &self.options.resolved_color {
                activity.set_color(color.clone());
            }
            self.timeline.push(activity);
        }
    }

    /// Open issues get a forecast end date. The available time counter is
    /// shared by the whole list, so each issue is scheduled behind every
    /// issue before it regardless of assignee.
    pub fn dispatch_current(&mut self, issues: &[Issue], reference: NaiveDate) {
        let mut available_time = 0.0;

        for issue in issues {
            let start = self.start_date(issue);
            let estimate =
                issue.compute_estimated_date_of_arrival(self.calendar, reference, available_time);
            available_time = estimate.available_time;

            tracing::debug!(
                "Issue {} forecast to end {} (scheduled load {:.2}d)",
                issue.id,
                estimate.date,
                available_time
            );

            self.timeline.push(Activity::new(
                issue.id,
                issue.handler_id,
                start,
                Some(start_of_day(estimate.date)),
                issue.progress(),
            ));
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }
}

/// Flatten a timeline into chart rows numbered from zero.
pub fn to_chart_rows(timeline: &Timeline, users: &UserDirectory) -> Vec<GanttRow> {
    timeline
        .lanes()
        .flat_map(|(user_id, activities)| activities.iter().map(move |a| (user_id, a)))
        .enumerate()
        .map(|(index, (user_id, activity))| GanttRow {
            index,
            kind: ActivityType::Normal,
            label: activity.issue_id.to_string(),
            start: activity.start.format(CHART_DATE_FORMAT).to_string(),
            end: activity
                .end
                .map(|end| end.format(CHART_DATE_FORMAT).to_string()),
            assignee: users.display_name(user_id),
            color: activity.color().map(str::to_string),
        })
        .collect()
}

pub fn build_graph(team: &Team, rows: Vec<GanttRow>) -> GanttGraph {
    GanttGraph {
        title: format!("Team '{}'", team.name),
        headers: vec![
            ScaleHeader::Year,
            ScaleHeader::Month,
            ScaleHeader::Day,
            ScaleHeader::Week,
        ],
        rows,
        constraints: Vec::new(),
        progress: Vec::new(),
    }
}

pub async fn load_team(
    repository: &dyn TrackerRepository,
    team_id: TeamId,
) -> Result<Team, ServiceError> {
    repository
        .team(team_id)
        .await?
        .ok_or(ServiceError::UnknownTeam(team_id))
}

/// Open issues of every team member, first occurrence of an id wins,
/// sorted in scheduling order.
pub async fn load_current_issues(
    repository: &dyn TrackerRepository,
    team: &Team,
) -> Result<Vec<Issue>, ServiceError> {
    let per_member = try_join_all(
        team.members
            .iter()
            .map(|user_id| repository.assigned_issues(*user_id)),
    )
    .await?;

    let mut seen = HashSet::new();
    let mut issues: Vec<Issue> = per_member
        .into_iter()
        .flatten()
        .filter(|issue| seen.insert(issue.id))
        .collect();
    issues.sort_by(Issue::scheduling_order);

    Ok(issues)
}

#[derive(Clone)]
pub struct GanttService {
    repository: Arc<dyn TrackerRepository>,
    statuses: StatusCatalog,
    calendar: WorkCalendar,
    options: GanttOptions,
}

impl GanttService {
    pub fn new(
        repository: Arc<dyn TrackerRepository>,
        statuses: StatusCatalog,
        calendar: WorkCalendar,
        options: GanttOptions,
    ) -> Self {
        Self {
            repository,
            statuses,
            calendar,
            options,
        }
    }

    pub async fn team_activities(
        &self,
        team_id: TeamId,
        period: Period,
        reference: NaiveDate,
    ) -> Result<(Team, Timeline), ServiceError> {
        let team = load_team(self.repository.as_ref(), team_id).await?;

        let resolved = self
            .repository
            .resolved_issues(team_id, period.start, period.end)
            .await?;
        let current = load_current_issues(self.repository.as_ref(), &team).await?;

        tracing::debug!(
            "Team {}: {} resolved and {} current issues",
            team_id,
            resolved.len(),
            current.len()
        );

        let mut manager = GanttManager::new(&self.statuses, &self.calendar, &self.options);
        manager.dispatch_resolved(&resolved);
        manager.dispatch_current(&current, reference);

        let timeline = manager.into_timeline();
        if timeline.is_empty() {
            tracing::info!("Team {} has no activity to display", team_id);
        }
        Ok((team, timeline))
    }

    pub async fn gantt_graph(
        &self,
        team_id: TeamId,
        period: Period,
        reference: NaiveDate,
    ) -> Result<GanttGraph, ServiceError> {
        let (team, timeline) = self.team_activities(team_id, period, reference).await?;
        let users = self.users(team_id).await?;
        let rows = to_chart_rows(&timeline, &users);
        Ok(build_graph(&team, rows))
    }

    pub async fn users(&self, team_id: TeamId) -> Result<UserDirectory, ServiceError> {
        Ok(UserDirectory::new(
            self.repository.team_members(team_id).await?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::issue::{change, test_issue};
    use crate::domain::status::{mantis_catalog, StatusId};
    use crate::domain::team::User;
    use crate::infrastructure::tracker_repository::{FileTrackerRepository, TrackerDocument};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_resolved_start_falls_back_to_submission() {
        let statuses = mantis_catalog();
        let calendar = WorkCalendar::default();
        let options = GanttOptions::default();
        let mut issue = test_issue(1, 7, "2024-01-01T00:00:00Z");
        issue.history = vec![change(80, "2024-01-10T12:00:00Z")];

        let mut manager = GanttManager::new(&statuses, &calendar, &options);
        manager.dispatch_resolved(&[issue]);

        let activity = &manager.timeline().activities_of(7)[0];
        assert_eq!(activity.start, ts("2024-01-01T00:00:00Z"));
        assert_eq!(activity.end, Some(ts("2024-01-10T12:00:00Z")));
    }

    #[test]
    fn test_resolved_end_fallback_chain() {
        let mut statuses = mantis_catalog();
        // closed below the threshold only happens with unusual workflows
        statuses.closed = StatusId(75);
        let calendar = WorkCalendar::default();
        let options = GanttOptions::default();

        let mut closed_only = test_issue(1, 7, "2024-01-01T00:00:00Z");
        closed_only.history = vec![
            change(30, "2024-01-02T00:00:00Z"),
            change(75, "2024-01-05T00:00:00Z"),
        ];
        let unresolved = test_issue(2, 7, "2024-01-01T00:00:00Z");

        let mut manager = GanttManager::new(&statuses, &calendar, &options);
        manager.dispatch_resolved(&[closed_only, unresolved]);

        let activities = manager.timeline().activities_of(7);
        assert_eq!(activities[0].start, ts("2024-01-02T00:00:00Z"));
        assert_eq!(activities[0].end, Some(ts("2024-01-05T00:00:00Z")));
        assert_eq!(activities[1].end, None);
    }

    #[test]
    fn test_resolved_takes_latest_status_above_threshold() {
        let statuses = mantis_catalog();
        let calendar = WorkCalendar::default();
        let options = GanttOptions {
            resolved_color: Some("grey".to_string()),
        };
        let mut issue = test_issue(1, 7, "2024-01-01T00:00:00Z");
        issue.history = vec![
            change(80, "2024-01-05T00:00:00Z"),
            change(85, "2024-01-08T00:00:00Z"),
        ];

        let mut manager = GanttManager::new(&statuses, &calendar, &options);
        manager.dispatch_resolved(&[issue]);

        let activity = &manager.timeline().activities_of(7)[0];
        assert_eq!(activity.end, Some(ts("2024-01-08T00:00:00Z")));
        assert_eq!(activity.color(), Some("grey"));
    }

    #[test]
    fn test_current_forecast_is_monotonic() {
        let statuses = mantis_catalog();
        let calendar = WorkCalendar::default();
        let options = GanttOptions::default();

        let mut a = test_issue(1, 7, "2024-01-01T00:00:00Z");
        a.remaining = Some(2.0);
        a.history = vec![change(30, "2024-01-03T00:00:00Z")];
        let mut b = test_issue(2, 8, "2024-01-02T00:00:00Z");
        b.remaining = Some(1.0);
        let mut c = test_issue(3, 7, "2024-01-02T00:00:00Z");
        c.effort_estimate = Some(3.0);

        let mut manager = GanttManager::new(&statuses, &calendar, &options);
        // Monday
        manager.dispatch_current(&[a, b, c], date(2024, 1, 8));

        let timeline = manager.timeline();
        let user7 = timeline.activities_of(7);
        let user8 = timeline.activities_of(8);

        assert_eq!(user7[0].start, ts("2024-01-03T00:00:00Z"));
        assert_eq!(user7[0].end, Some(ts("2024-01-09T00:00:00Z")));
        // the shared counter pushes user 8's issue behind user 7's first issue
        assert_eq!(user8[0].start, ts("2024-01-02T00:00:00Z"));
        assert_eq!(user8[0].end, Some(ts("2024-01-10T00:00:00Z")));
        // 6 days of load from Monday ends the following Monday
        assert_eq!(user7[1].end, Some(ts("2024-01-15T00:00:00Z")));
    }

    #[test]
    fn test_chart_rows_are_contiguous() {
        let statuses = mantis_catalog();
        let calendar = WorkCalendar::default();
        let options = GanttOptions::default();
        let issues = vec![
            test_issue(10, 1, "2024-01-01T00:00:00Z"),
            test_issue(11, 2, "2024-01-01T00:00:00Z"),
            test_issue(12, 1, "2024-01-01T00:00:00Z"),
        ];

        let mut manager = GanttManager::new(&statuses, &calendar, &options);
        manager.dispatch_current(&issues, date(2024, 1, 8));

        let users = UserDirectory::new(vec![User {
            id: 1,
            name: "alice".to_string(),
        }]);
        let rows = to_chart_rows(manager.timeline(), &users);

        let indices: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        // grouped by user, first seen first
        assert_eq!(labels, vec!["10", "12", "11"]);
        assert_eq!(rows[0].assignee, "alice");
        assert_eq!(rows[2].assignee, "user 2");
        assert_eq!(rows[0].start, "2024-01-01");
        assert_eq!(rows[0].end.as_deref(), Some("2024-01-08"));
        assert!(rows.iter().all(|r| r.kind == ActivityType::Normal));
    }

    #[test]
    fn test_period_resolution() {
        let period = Period::resolve(None, None, date(2024, 3, 31)).unwrap();
        assert_eq!(period.start, ts("2024-03-01T00:00:00Z"));
        assert_eq!(period.end, ts("2024-03-31T23:59:59Z"));
        assert!(period.contains(ts("2024-03-31T12:00:00Z")));

        let err = Period::resolve(Some(date(2024, 3, 2)), Some(date(2024, 3, 1)), date(2024, 3, 31));
        assert!(matches!(err, Err(ServiceError::InvalidRequest(_))));

        let earlier =
            Period::resolve(Some(date(2024, 1, 1)), Some(date(2024, 1, 2)), date(2024, 3, 31))
                .unwrap();
        let union = period.union(earlier);
        assert_eq!(union.start, ts("2024-01-01T00:00:00Z"));
        assert_eq!(union.end, period.end);
    }

    fn sample_document() -> TrackerDocument {
        serde_json::from_value(serde_json::json!({
            "teams": [{ "id": 1, "name": "core", "members": [7, 8] }],
            "users": [{ "id": 7, "name": "alice" }, { "id": 8, "name": "bob" }],
            "issues": [
                {
                    "id": 100, "summary": "done", "handler_id": 7,
                    "submitted_at": "2024-01-02T00:00:00Z", "status": 90,
                    "history": [
                        { "status": 30, "at": "2024-01-03T00:00:00Z" },
                        { "status": 80, "at": "2024-01-04T00:00:00Z" }
                    ]
                },
                {
                    "id": 101, "summary": "open low", "handler_id": 7,
                    "submitted_at": "2024-01-02T00:00:00Z", "status": 30,
                    "priority": 10, "remaining": 1.0
                },
                {
                    "id": 102, "summary": "open urgent", "handler_id": 8,
                    "submitted_at": "2024-01-02T00:00:00Z", "status": 50,
                    "priority": 50, "remaining": 2.0
                }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_gantt_graph_for_team() {
        let repository = Arc::new(FileTrackerRepository::from_document(
            sample_document(),
            mantis_catalog(),
        ));
        let service = GanttService::new(
            repository,
            mantis_catalog(),
            WorkCalendar::default(),
            GanttOptions::default(),
        );

        let reference = date(2024, 1, 8);
        let period = Period::resolve(Some(date(2024, 1, 1)), None, reference).unwrap();
        let graph = service.gantt_graph(1, period, reference).await.unwrap();

        assert_eq!(graph.title, "Team 'core'");
        assert!(graph.constraints.is_empty());
        assert!(graph.progress.is_empty());

        let rows: Vec<(&str, &str, Option<&str>)> = graph
            .rows
            .iter()
            .map(|r| (r.label.as_str(), r.assignee.as_str(), r.end.as_deref()))
            .collect();
        // urgent issue 102 is scheduled first, 101 waits behind it
        assert_eq!(
            rows,
            vec![
                ("100", "alice", Some("2024-01-04")),
                ("101", "alice", Some("2024-01-10")),
                ("102", "bob", Some("2024-01-09")),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_team() {
        let repository = Arc::new(FileTrackerRepository::from_document(
            sample_document(),
            mantis_catalog(),
        ));
        let service = GanttService::new(
            repository,
            mantis_catalog(),
            WorkCalendar::default(),
            GanttOptions::default(),
        );

        let reference = date(2024, 1, 8);
        let period = Period::resolve(None, None, reference).unwrap();
        let result = service.gantt_graph(42, period, reference).await;
        assert!(matches!(result, Err(ServiceError::UnknownTeam(42))));
    }
}
