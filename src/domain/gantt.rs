// Gantt domain models
use super::issue::{IssueId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Work span of one issue for its assignee.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub issue_id: IssueId,
    pub user_id: UserId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub progress: f64,
    color: Option<String>,
}

impl Activity {
    pub fn new(
        issue_id: IssueId,
        user_id: UserId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        progress: f64,
    ) -> Self {
        Self {
            issue_id,
            user_id,
            start,
            end,
            progress,
            color: None,
        }
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = Some(color.into());
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

/// Activities grouped by assignee. Assignees keep the order in which they
/// were first seen, activities keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    lanes: Vec<(UserId, Vec<Activity>)>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, activity: Activity) {
        match self.lanes.iter_mut().find(|(u, _)| *u == activity.user_id) {
            Some((_, activities)) => activities.push(activity),
            None => self.lanes.push((activity.user_id, vec![activity])),
        }
    }

    pub fn activities_of(&self, user_id: UserId) -> &[Activity] {
        self.lanes
            .iter()
            .find(|(u, _)| *u == user_id)
            .map(|(_, a)| a.as_slice())
            .unwrap_or(&[])
    }

    pub fn lanes(&self) -> impl Iterator<Item = (UserId, &[Activity])> {
        self.lanes.iter().map(|(u, a)| (*u, a.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(|(_, a)| a.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Normal,
}

/// One row handed to the chart builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttRow {
    pub index: usize,
    pub kind: ActivityType,
    pub label: String,
    pub start: String,
    pub end: Option<String>,
    pub assignee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleHeader {
    Year,
    Month,
    Week,
    Day,
}

/// Chart-ready document consumed by the Gantt renderer.
#[derive(Debug, Clone, Serialize)]
pub struct GanttGraph {
    pub title: String,
    pub headers: Vec<ScaleHeader>,
    pub rows: Vec<GanttRow>,
    /// (from row, to row) dependencies
    pub constraints: Vec<(usize, usize)>,
    /// (row, completion ratio)
    pub progress: Vec<(usize, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(issue_id: IssueId, user_id: UserId) -> Activity {
        Activity::new(issue_id, user_id, "2024-01-01T00:00:00Z".parse().unwrap(), None, 0.0)
    }

    #[test]
    fn test_timeline_keeps_insertion_order() {
        let mut timeline = Timeline::new();
        timeline.push(activity(1, 5));
        timeline.push(activity(2, 3));
        timeline.push(activity(3, 5));

        let lanes: Vec<(UserId, Vec<IssueId>)> = timeline
            .lanes()
            .map(|(u, a)| (u, a.iter().map(|x| x.issue_id).collect()))
            .collect();
        assert_eq!(lanes, vec![(5, vec![1, 3]), (3, vec![2])]);
        assert_eq!(timeline.len(), 3);
        assert!(timeline.activities_of(9).is_empty());
    }

    #[test]
    fn test_activity_color() {
        let mut a = activity(1, 5);
        assert_eq!(a.color(), None);
        a.set_color("grey");
        assert_eq!(a.color(), Some("grey"));
    }
}
