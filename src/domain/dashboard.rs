// Dashboard domain model
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Page area a dashboard is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginDomain {
    Homepage,
    Team,
    User,
    Project,
    Command,
    CommandSet,
    ServiceContract,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginCategory {
    Activity,
    Roadmap,
    Planning,
    Quality,
    Financial,
    Risk,
    Team,
    Admin,
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PluginCategory::Activity => "Activity",
            PluginCategory::Roadmap => "Roadmap",
            PluginCategory::Planning => "Planning",
            PluginCategory::Quality => "Quality",
            PluginCategory::Financial => "Financial",
            PluginCategory::Risk => "Risk",
            PluginCategory::Team => "Team",
            PluginCategory::Admin => "Admin",
        };
        f.write_str(label)
    }
}

/// One displayed plugin and its specific attributes. The same plugin may
/// appear several times with different attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginAttributes {
    #[serde(rename = "pluginClassName")]
    pub plugin_name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl PluginAttributes {
    pub fn new(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            attributes: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "displayedPlugins", default)]
    pub displayed_plugins: Vec<PluginAttributes>,
}

/// Static placement of a dashboard, keyed by a deployment-wide unique id.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardDefinition {
    pub id: String,
    pub domain: PluginDomain,
    pub categories: Vec<PluginCategory>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub id: String,
    pub color: String,
    pub title: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub category: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginCandidate {
    #[serde(rename = "pluginClassName")]
    pub plugin_name: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub dashboard_id: String,
    pub title: String,
    pub plugin_candidates: Vec<PluginCandidate>,
    pub widgets: Vec<Widget>,
}
