// Indicator plugin contract and registry
use crate::application::data_provider::PluginDataProvider;
use crate::domain::dashboard::{PluginCategory, PluginDomain};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Static metadata of an indicator.
#[derive(Debug)]
pub struct PluginDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub domains: &'static [PluginDomain],
    pub categories: &'static [PluginCategory],
    /// Template file the widget body is rendered from
    pub template: &'static str,
}

impl PluginDescriptor {
    pub fn is_candidate(&self, domain: PluginDomain, categories: &[PluginCategory]) -> bool {
        self.domains.contains(&domain) && self.categories.iter().any(|c| categories.contains(c))
    }

    pub fn category_label(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin {0} is not registered")]
    Unknown(String),

    #[error("invalid attribute {name}: {reason}")]
    InvalidAttribute { name: String, reason: String },

    #[error("plugin execution failed: {0}")]
    Execution(String),

    #[error("widget rendering failed: {0}")]
    Render(#[from] askama::Error),
}

impl PluginError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        PluginError::InvalidAttribute {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub trait IndicatorPlugin: Send {
    fn descriptor(&self) -> &'static PluginDescriptor;

    /// Apply the attributes stored with the dashboard entry
    fn apply_settings(&mut self, attributes: &Map<String, Value>) -> Result<(), PluginError>;

    fn execute(&mut self) -> Result<(), PluginError>;

    /// Widget body rendered from the plugin's template
    fn render_output(&self) -> Result<String, PluginError>;
}

pub type PluginFactory = fn(Arc<PluginDataProvider>) -> Box<dyn IndicatorPlugin>;

struct Registration {
    descriptor: &'static PluginDescriptor,
    factory: PluginFactory,
}

/// Plugins by stable name, in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    entries: Vec<Registration>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: &'static PluginDescriptor, factory: PluginFactory) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|r| r.descriptor.name == descriptor.name)
        {
            tracing::warn!("Plugin {} registered twice, keeping the last one", descriptor.name);
            existing.descriptor = descriptor;
            existing.factory = factory;
            return;
        }
        self.entries.push(Registration {
            descriptor,
            factory,
        });
    }

    fn registration(&self, name: &str) -> Option<&Registration> {
        self.entries.iter().find(|r| r.descriptor.name == name)
    }

    /// Plugins allowed in a dashboard placed in `domain` showing `categories`
    pub fn candidates(
        &self,
        domain: PluginDomain,
        categories: &[PluginCategory],
    ) -> Vec<&'static PluginDescriptor> {
        self.entries
            .iter()
            .filter(|r| r.descriptor.is_candidate(domain, categories))
            .map(|r| r.descriptor)
            .collect()
    }

    pub fn instantiate(
        &self,
        name: &str,
        provider: Arc<PluginDataProvider>,
    ) -> Result<Box<dyn IndicatorPlugin>, PluginError> {
        let registration = self
            .registration(name)
            .ok_or_else(|| PluginError::Unknown(name.to_string()))?;
        Ok((registration.factory)(provider))
    }
}
