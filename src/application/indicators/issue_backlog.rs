// Issue backlog indicator - Open issues per status
use super::{bool_attribute, ATTR_GRAPH_ONLY};
use crate::application::data_provider::PluginDataProvider;
use crate::application::plugin::{IndicatorPlugin, PluginDescriptor, PluginError};
use crate::domain::dashboard::{PluginCategory, PluginDomain};
use crate::domain::status::StatusId;
use askama::Template;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

const ATTR_USER_ONLY: &str = "userOnly";

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "IssueBacklog",
    title: "Issue backlog",
    description: "Number of open issues per status",
    domains: &[PluginDomain::Homepage, PluginDomain::Team, PluginDomain::User],
    categories: &[PluginCategory::Quality, PluginCategory::Activity],
    template: "issue_backlog.html",
};

struct StatusCount {
    status: String,
    count: usize,
}

#[derive(Template)]
#[template(path = "issue_backlog.html")]
struct IssueBacklogWidget {
    total: usize,
    rows: Vec<StatusCount>,
    is_graph_only: bool,
}

pub struct IssueBacklog {
    provider: Arc<PluginDataProvider>,
    user_only: bool,
    graph_only: bool,
    counts: BTreeMap<StatusId, usize>,
}

impl IssueBacklog {
    pub fn create(provider: Arc<PluginDataProvider>) -> Box<dyn IndicatorPlugin> {
        Box::new(Self {
            provider,
            user_only: false,
            graph_only: false,
            counts: BTreeMap::new(),
        })
    }
}

impl IndicatorPlugin for IssueBacklog {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn apply_settings(&mut self, attributes: &Map<String, Value>) -> Result<(), PluginError> {
        self.user_only = bool_attribute(attributes, ATTR_USER_ONLY, false)?;
        self.graph_only = bool_attribute(attributes, ATTR_GRAPH_ONLY, false)?;
        Ok(())
    }

    fn execute(&mut self) -> Result<(), PluginError> {
        let user_id = self.provider.user_id;
        let user_only = self.user_only;
        let mut counts = BTreeMap::new();
        for issue in self
            .provider
            .current_issues
            .iter()
            .filter(|i| !user_only || i.handler_id == user_id)
        {
            *counts.entry(issue.status).or_insert(0) += 1;
        }
        self.counts = counts;
        Ok(())
    }

    fn render_output(&self) -> Result<String, PluginError> {
        let statuses = &self.provider.statuses;
        let widget = IssueBacklogWidget {
            total: self.counts.values().sum(),
            rows: self
                .counts
                .iter()
                .map(|(status, count)| StatusCount {
                    status: statuses.name_of(*status),
                    count: *count,
                })
                .collect(),
            is_graph_only: self.graph_only,
        };
        Ok(widget.render()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_provider::test_provider;
    use crate::domain::issue::test_issue;
    use chrono::NaiveDate;
    use serde_json::json;

    fn provider() -> Arc<PluginDataProvider> {
        let mut a = test_issue(1, 7, "2024-01-01T00:00:00Z");
        a.status = StatusId(50);
        let b = test_issue(2, 8, "2024-01-01T00:00:00Z");
        let c = test_issue(3, 7, "2024-01-01T00:00:00Z");
        Arc::new(test_provider(
            Vec::new(),
            vec![a, b, c],
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        ))
    }

    #[test]
    fn test_counts_per_status() {
        let mut plugin = IssueBacklog::create(provider());
        plugin.apply_settings(&Map::new()).unwrap();
        plugin.execute().unwrap();

        let html = plugin.render_output().unwrap();
        assert!(html.contains("<p>3 open issues</p>"));
        let new = html.find("<tr><td>new</td><td>2</td></tr>").unwrap();
        let opened = html.find("<tr><td>opened</td><td>1</td></tr>").unwrap();
        assert!(new < opened);
    }

    #[test]
    fn test_user_only() {
        let mut plugin = IssueBacklog::create(provider());
        let attrs = json!({ "userOnly": true });
        plugin.apply_settings(attrs.as_object().unwrap()).unwrap();
        plugin.execute().unwrap();

        assert!(plugin.render_output().unwrap().contains("<p>2 open issues</p>"));
    }

    #[test]
    fn test_rejects_bad_attribute() {
        let mut plugin = IssueBacklog::create(provider());
        let attrs = json!({ "userOnly": "maybe" });
        let err = plugin.apply_settings(attrs.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, PluginError::InvalidAttribute { name, .. } if name == "userOnly"));
    }
}
