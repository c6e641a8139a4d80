// Issue domain model (read-only view of the issue tracker)
use super::calendar::{ArrivalEstimate, WorkCalendar};
use super::status::StatusId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::cmp::Ordering;

pub type IssueId = u32;
pub type UserId = u32;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusChange {
    pub status: StatusId,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub summary: String,
    pub handler_id: UserId,
    pub submitted_at: DateTime<Utc>,
    pub status: StatusId,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Remaining effort in days.
    #[serde(default)]
    pub remaining: Option<f64>,
    /// Initial effort estimate in days.
    #[serde(default)]
    pub effort_estimate: Option<f64>,
    /// Time already spent in days.
    #[serde(default)]
    pub elapsed: f64,
    #[serde(default)]
    pub history: Vec<StatusChange>,
}

impl Issue {
    pub fn first_status_occurrence(&self, status: StatusId) -> Option<DateTime<Utc>> {
        self.history
            .iter()
            .filter(|c| c.status == status)
            .map(|c| c.at)
            .min()
    }

    pub fn latest_status_occurrence(&self, status: StatusId) -> Option<DateTime<Utc>> {
        self.history
            .iter()
            .filter(|c| c.status == status)
            .map(|c| c.at)
            .max()
    }

    /// Latest transition into any status at or above `threshold`.
    pub fn latest_occurrence_at_or_above(&self, threshold: StatusId) -> Option<DateTime<Utc>> {
        self.history
            .iter()
            .filter(|c| c.status >= threshold)
            .map(|c| c.at)
            .max()
    }

    pub fn effective_remaining(&self) -> f64 {
        self.remaining.or(self.effort_estimate).unwrap_or(0.0).max(0.0)
    }

    /// Completion ratio from elapsed and remaining effort.
    pub fn progress(&self) -> f64 {
        let total = self.elapsed + self.effective_remaining();
        if total <= 0.0 {
            0.0
        } else {
            (self.elapsed / total).clamp(0.0, 1.0)
        }
    }

    pub fn compute_estimated_date_of_arrival(
        &self,
        calendar: &WorkCalendar,
        reference: NaiveDate,
        available_time: f64,
    ) -> ArrivalEstimate {
        calendar.estimate_arrival(reference, available_time, self.effective_remaining())
    }

    /// Scheduling order: earliest deadline first (issues without one last),
    /// then highest priority, then lowest id.
    pub fn scheduling_order(a: &Issue, b: &Issue) -> Ordering {
        let deadline = match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        deadline
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
pub(crate) fn test_issue(id: IssueId, handler_id: UserId, submitted: &str) -> Issue {
    Issue {
        id,
        summary: format!("issue {}", id),
        handler_id,
        submitted_at: submitted.parse().unwrap(),
        status: StatusId(10),
        priority: 0,
        deadline: None,
        remaining: None,
        effort_estimate: None,
        elapsed: 0.0,
        history: Vec::new(),
    }
}

#[cfg(test)]
pub(crate) fn change(status: u32, at: &str) -> StatusChange {
    StatusChange {
        status: StatusId(status),
        at: at.parse().unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_occurrences() {
        let mut issue = test_issue(1, 7, "2024-01-01T09:00:00Z");
        issue.history = vec![
            change(30, "2024-01-03T10:00:00Z"),
            change(20, "2024-01-04T10:00:00Z"),
            change(30, "2024-01-05T10:00:00Z"),
            change(80, "2024-01-09T10:00:00Z"),
            change(90, "2024-01-12T10:00:00Z"),
        ];

        assert_eq!(
            issue.first_status_occurrence(StatusId(30)),
            Some("2024-01-03T10:00:00Z".parse().unwrap())
        );
        assert_eq!(
            issue.latest_status_occurrence(StatusId(30)),
            Some("2024-01-05T10:00:00Z".parse().unwrap())
        );
        assert_eq!(
            issue.latest_occurrence_at_or_above(StatusId(80)),
            Some("2024-01-12T10:00:00Z".parse().unwrap())
        );
        assert_eq!(issue.first_status_occurrence(StatusId(50)), None);
    }

    #[test]
    fn test_effective_remaining_and_progress() {
        let mut issue = test_issue(1, 7, "2024-01-01T09:00:00Z");
        assert_eq!(issue.effective_remaining(), 0.0);
        assert_eq!(issue.progress(), 0.0);

        issue.effort_estimate = Some(4.0);
        assert_eq!(issue.effective_remaining(), 4.0);

        issue.remaining = Some(3.0);
        issue.elapsed = 1.0;
        assert_eq!(issue.effective_remaining(), 3.0);
        assert_eq!(issue.progress(), 0.25);
    }

    #[test]
    fn test_scheduling_order() {
        let mut a = test_issue(1, 7, "2024-01-01T09:00:00Z");
        let mut b = test_issue(2, 7, "2024-01-01T09:00:00Z");
        let mut c = test_issue(3, 7, "2024-01-01T09:00:00Z");
        a.priority = 10;
        b.priority = 40;
        c.deadline = NaiveDate::from_ymd_opt(2024, 2, 1);

        let mut issues = vec![a, b, c];
        issues.sort_by(Issue::scheduling_order);
        let ids: Vec<IssueId> = issues.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
