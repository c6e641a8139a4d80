// Workload indicator - Remaining effort per team member
use crate::application::data_provider::PluginDataProvider;
use crate::application::plugin::{IndicatorPlugin, PluginDescriptor, PluginError};
use crate::domain::dashboard::{PluginCategory, PluginDomain};
use crate::domain::issue::UserId;
use askama::Template;
use serde_json::{Map, Value};
use std::sync::Arc;

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "UserWorkload",
    title: "Workload per user",
    description: "Remaining effort of open issues for each team member",
    domains: &[PluginDomain::Team],
    categories: &[PluginCategory::Planning, PluginCategory::Team],
    template: "user_workload.html",
};

struct UserLoad {
    user: String,
    count: usize,
    remaining: f64,
}

#[derive(Template)]
#[template(path = "user_workload.html")]
struct UserWorkloadWidget {
    total: f64,
    rows: Vec<UserLoad>,
}

pub struct UserWorkload {
    provider: Arc<PluginDataProvider>,
    loads: Vec<(UserId, f64, usize)>,
}

impl UserWorkload {
    pub fn create(provider: Arc<PluginDataProvider>) -> Box<dyn IndicatorPlugin> {
        Box::new(Self {
            provider,
            loads: Vec::new(),
        })
    }
}

impl IndicatorPlugin for UserWorkload {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn apply_settings(&mut self, _attributes: &Map<String, Value>) -> Result<(), PluginError> {
        Ok(())
    }

    fn execute(&mut self) -> Result<(), PluginError> {
        let p = &self.provider;
        self.loads = p
            .team
            .members
            .iter()
            .map(|user_id| {
                let issues = p.current_issues.iter().filter(|i| i.handler_id == *user_id);
                let (remaining, count) = issues.fold((0.0, 0), |(sum, n), i| {
                    (sum + i.effective_remaining(), n + 1)
                });
                (*user_id, remaining, count)
            })
            .collect();
        Ok(())
    }

    fn render_output(&self) -> Result<String, PluginError> {
        let users = &self.provider.users;
        let widget = UserWorkloadWidget {
            total: self.loads.iter().map(|(_, r, _)| r).sum(),
            rows: self
                .loads
                .iter()
                .map(|(user_id, remaining, count)| UserLoad {
                    user: users.display_name(*user_id),
                    count: *count,
                    remaining: *remaining,
                })
                .collect(),
        };
        Ok(widget.render()?)
    }
}
