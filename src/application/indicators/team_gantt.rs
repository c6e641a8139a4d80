// Team Gantt indicator - Timeline of resolved and forecast issues
use super::{bool_attribute, ATTR_GRAPH_ONLY};
use crate::application::data_provider::PluginDataProvider;
use crate::application::gantt_service::{to_chart_rows, GanttManager};
use crate::application::plugin::{IndicatorPlugin, PluginDescriptor, PluginError};
use crate::domain::dashboard::{PluginCategory, PluginDomain};
use crate::domain::gantt::GanttRow;
use askama::Template;
use serde_json::{Map, Value};
use std::sync::Arc;

const ATTR_SHOW_RESOLVED: &str = "showResolved";

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "TeamGantt",
    title: "Team Gantt",
    description: "Resolved tasks and completion forecast of open tasks, per team member",
    domains: &[PluginDomain::Team, PluginDomain::Homepage],
    categories: &[PluginCategory::Planning, PluginCategory::Roadmap],
    template: "team_gantt.html",
};

/// Row table plus the raw chart rows as a JSON payload for the chart renderer
#[derive(Template)]
#[template(path = "team_gantt.html")]
struct TeamGanttWidget<'a> {
    title: String,
    rows: &'a [GanttRow],
    is_graph_only: bool,
}

pub struct TeamGantt {
    provider: Arc<PluginDataProvider>,
    show_resolved: bool,
    graph_only: bool,
    rows: Vec<GanttRow>,
}

impl TeamGantt {
    pub fn create(provider: Arc<PluginDataProvider>) -> Box<dyn IndicatorPlugin> {
        Box::new(Self {
            provider,
            show_resolved: true,
            graph_only: false,
            rows: Vec::new(),
        })
    }
}

impl IndicatorPlugin for TeamGantt {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn apply_settings(&mut self, attributes: &Map<String, Value>) -> Result<(), PluginError> {
        self.show_resolved = bool_attribute(attributes, ATTR_SHOW_RESOLVED, true)?;
        self.graph_only = bool_attribute(attributes, ATTR_GRAPH_ONLY, false)?;
        Ok(())
    }

    fn execute(&mut self) -> Result<(), PluginError> {
        let p = &self.provider;
        let mut manager = GanttManager::new(&p.statuses, &p.calendar, &p.gantt);
        if self.show_resolved {
            manager.dispatch_resolved(p.resolved_within(Some(p.period)));
        }
        manager.dispatch_current(&p.current_issues, p.reference_date);
        self.rows = to_chart_rows(manager.timeline(), &p.users);
        Ok(())
    }

    fn render_output(&self) -> Result<String, PluginError> {
        let widget = TeamGanttWidget {
            title: format!("Team '{}'", self.provider.team.name),
            rows: &self.rows,
            is_graph_only: self.graph_only,
        };
        Ok(widget.render()?)
    }
}
