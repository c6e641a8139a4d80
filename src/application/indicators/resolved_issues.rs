// Resolved issues indicator
use super::{bool_attribute, DateRange, ATTR_GRAPH_ONLY};
use crate::application::data_provider::PluginDataProvider;
use crate::application::plugin::{IndicatorPlugin, PluginDescriptor, PluginError};
use crate::domain::dashboard::{PluginCategory, PluginDomain};
use crate::domain::issue::IssueId;
use askama::Template;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "ResolvedIssues",
    title: "Resolved issues",
    description: "Issues resolved in the period with their lead time",
    domains: &[PluginDomain::Team, PluginDomain::Homepage],
    categories: &[PluginCategory::Activity],
    template: "resolved_issues.html",
};

struct ResolvedRow {
    issue_id: IssueId,
    summary: String,
    assignee: String,
    resolved_at: DateTime<Utc>,
    lead_time_days: i64,
}

#[derive(Template)]
#[template(path = "resolved_issues.html")]
struct ResolvedIssuesWidget<'a> {
    range: &'a str,
    rows: &'a [ResolvedRow],
    is_graph_only: bool,
}

pub struct ResolvedIssues {
    provider: Arc<PluginDataProvider>,
    date_range: DateRange,
    graph_only: bool,
    rows: Vec<ResolvedRow>,
}

impl ResolvedIssues {
    pub fn create(provider: Arc<PluginDataProvider>) -> Box<dyn IndicatorPlugin> {
        Box::new(Self {
            provider,
            date_range: DateRange::default(),
            graph_only: false,
            rows: Vec::new(),
        })
    }
}

impl IndicatorPlugin for ResolvedIssues {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn apply_settings(&mut self, attributes: &Map<String, Value>) -> Result<(), PluginError> {
        self.date_range = DateRange::from_attributes(attributes)?;
        self.graph_only = bool_attribute(attributes, ATTR_GRAPH_ONLY, false)?;
        Ok(())
    }

    fn execute(&mut self) -> Result<(), PluginError> {
        let p = &self.provider;
        let period = self.date_range.period(p)?;

        let mut rows: Vec<ResolvedRow> = p
            .resolved_within(period)
            .filter_map(|issue| {
                let resolved_at =
                    issue.latest_occurrence_at_or_above(p.statuses.resolved_threshold)?;
                let started = issue
                    .first_status_occurrence(p.statuses.acknowledged)
                    .unwrap_or(issue.submitted_at);
                Some(ResolvedRow {
                    issue_id: issue.id,
                    summary: issue.summary.clone(),
                    assignee: p.users.display_name(issue.handler_id),
                    resolved_at,
                    lead_time_days: (resolved_at - started).num_days(),
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.resolved_at, r.issue_id));

        self.rows = rows;
        Ok(())
    }

    fn render_output(&self) -> Result<String, PluginError> {
        let widget = ResolvedIssuesWidget {
            range: self.date_range.label(),
            rows: &self.rows,
            is_graph_only: self.graph_only,
        };
        Ok(widget.render()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_provider::test_provider;
    use crate::domain::issue::{change, test_issue};
    use chrono::NaiveDate;
    use serde_json::json;

    fn provider() -> Arc<PluginDataProvider> {
        let mut early = test_issue(1, 7, "2024-01-02T00:00:00Z");
        early.history = vec![
            change(30, "2024-01-03T00:00:00Z"),
            change(80, "2024-01-05T00:00:00Z"),
        ];
        let mut late = test_issue(2, 8, "2024-01-10T00:00:00Z");
        late.history = vec![change(90, "2024-01-16T00:00:00Z")];
        // resolved long before the dashboard period
        let mut old = test_issue(3, 7, "2023-10-20T00:00:00Z");
        old.history = vec![change(80, "2023-11-01T00:00:00Z")];
        // Wednesday
        Arc::new(test_provider(
            vec![late, early, old],
            Vec::new(),
            NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
        ))
    }

    fn render(attributes: Value) -> String {
        let mut plugin = ResolvedIssues::create(provider());
        plugin.apply_settings(attributes.as_object().unwrap()).unwrap();
        plugin.execute().unwrap();
        plugin.render_output().unwrap()
    }

    #[test]
    fn test_lists_resolved_in_order() {
        let html = render(json!({}));

        assert!(html.contains("<p>2 issues resolved (selected period)</p>"));
        let first = html
            .find("<tr><td>1</td><td>issue 1</td><td>alice</td><td>2024-01-05</td><td>2</td></tr>")
            .unwrap();
        let second = html
            .find("<tr><td>2</td><td>issue 2</td><td>bob</td><td>2024-01-16</td><td>6</td></tr>")
            .unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_current_week_range() {
        let html = render(json!({ "dateRange": "currentWeek" }));
        assert!(html.contains("<p>1 issues resolved (current week)</p>"));
    }

    #[test]
    fn test_no_date_limit_includes_older_resolutions() {
        let html = render(json!({ "dateRange": "noDateLimit" }));
        assert!(html.contains("<p>3 issues resolved (no date limit)</p>"));
        assert!(html.contains("<td>3</td><td>issue 3</td><td>alice</td><td>2023-11-01</td><td>12</td>"));
    }

    #[test]
    fn test_summary_is_escaped() {
        let mut issue = test_issue(4, 7, "2024-01-10T00:00:00Z");
        issue.summary = "<img src=x> ${count}".to_string();
        issue.history = vec![change(80, "2024-01-12T00:00:00Z")];
        let provider = Arc::new(test_provider(
            vec![issue],
            Vec::new(),
            NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
        ));

        let mut plugin = ResolvedIssues::create(provider);
        plugin.apply_settings(&Map::new()).unwrap();
        plugin.execute().unwrap();
        let html = plugin.render_output().unwrap();

        assert!(!html.contains("<img"));
        assert!(html.contains("${count}"));
    }
}
