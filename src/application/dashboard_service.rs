// Dashboard service - Use case for building dashboards
use crate::application::data_provider::{PluginDataProvider, ProviderContext};
use crate::application::error::ServiceError;
use crate::application::gantt_service::Period;
use crate::application::indicators::DateRange;
use crate::application::plugin::{PluginDescriptor, PluginError, PluginRegistry};
use crate::application::settings_store::{SettingKey, SettingScope, SettingsError, SettingsStore};
use crate::application::tracker_repository::TrackerRepository;
use crate::domain::dashboard::{
    DashboardDefinition, DashboardSettings, DashboardView, PluginAttributes, PluginCandidate,
    PluginCategory, PluginDomain, Widget,
};
use crate::domain::issue::UserId;
use crate::domain::team::TeamId;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_WIDGET_COLOR: &str = "color-white";
const ATTR_COLOR: &str = "color";

/// Settings for (dashboard, team, user): the user's own, else the team's,
/// else every eligible plugin with no attributes. A stored document that
/// does not decode yields an empty plugin list, not the default.
pub async fn resolve_settings(
    store: &dyn SettingsStore,
    registry: &PluginRegistry,
    definition: &DashboardDefinition,
    team_id: TeamId,
    user_id: UserId,
) -> Result<DashboardSettings, SettingsError> {
    let user_key = SettingKey::dashboard(&definition.id, SettingScope::team_user(team_id, user_id));
    let mut stored = store.get(&user_key).await?;

    if stored.is_none() {
        let team_key = SettingKey::dashboard(&definition.id, SettingScope::team(team_id));
        stored = store.get(&team_key).await?;
    }

    let Some(json) = stored else {
        return Ok(default_settings(registry, definition.domain, &definition.categories));
    };

    match serde_json::from_str::<DashboardSettings>(&json) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            tracing::error!("Dashboard {} settings could not be decoded: {}", definition.id, e);
            Ok(DashboardSettings::default())
        }
    }
}

fn default_settings(
    registry: &PluginRegistry,
    domain: PluginDomain,
    categories: &[PluginCategory],
) -> DashboardSettings {
    DashboardSettings {
        title: None,
        displayed_plugins: registry
            .candidates(domain, categories)
            .into_iter()
            .map(|d| PluginAttributes::new(d.name))
            .collect(),
    }
}

/// Render every settings entry that is still a candidate. Entries that are
/// not candidates or whose plugin fails are logged and skipped.
pub fn render_dashboard(
    registry: &PluginRegistry,
    provider: Arc<PluginDataProvider>,
    definition: &DashboardDefinition,
    settings: &DashboardSettings,
) -> DashboardView {
    let candidates = registry.candidates(definition.domain, &definition.categories);
    let mut widgets = Vec::new();

    for entry in &settings.displayed_plugins {
        let Some(descriptor) = candidates
            .iter()
            .find(|d| d.name == entry.plugin_name)
            .copied()
        else {
            tracing::warn!(
                "Dashboard {}: {} is not a candidate",
                definition.id,
                entry.plugin_name
            );
            continue;
        };

        match render_widget(registry, provider.clone(), descriptor, entry) {
            Ok((content, metadata)) => {
                widgets.push(Widget {
                    id: format!("w_{}", widgets.len() + 1),
                    color: entry
                        .attributes
                        .get(ATTR_COLOR)
                        .and_then(Value::as_str)
                        .unwrap_or(DEFAULT_WIDGET_COLOR)
                        .to_string(),
                    title: metadata.title.to_string(),
                    description: metadata.description.to_string(),
                    category: metadata.category_label(),
                    content,
                });
            }
            Err(e) => {
                tracing::error!(
                    "Dashboard {}: plugin {} ({}) failed: {}",
                    definition.id,
                    entry.plugin_name,
                    descriptor.template,
                    e
                );
            }
        }
    }

    DashboardView {
        dashboard_id: definition.id.clone(),
        title: settings
            .title
            .clone()
            .unwrap_or_else(|| definition.title.clone()),
        plugin_candidates: candidates
            .iter()
            .map(|d| PluginCandidate {
                plugin_name: d.name.to_string(),
                title: d.title.to_string(),
            })
            .collect(),
        widgets,
    }
}

fn render_widget(
    registry: &PluginRegistry,
    provider: Arc<PluginDataProvider>,
    descriptor: &PluginDescriptor,
    entry: &PluginAttributes,
) -> Result<(String, &'static PluginDescriptor), PluginError> {
    let mut plugin = registry.instantiate(descriptor.name, provider)?;
    plugin.apply_settings(&entry.attributes)?;
    plugin.execute()?;
    Ok((plugin.render_output()?, plugin.descriptor()))
}

/// Resolution window covering the dashboard period and every entry's date
/// range. `None` when an entry asks for no limit. Entries with an invalid
/// range are left to fail at render time.
fn resolved_window(
    settings: &DashboardSettings,
    period: Period,
    reference: NaiveDate,
) -> Option<Period> {
    let mut window = period;
    for entry in &settings.displayed_plugins {
        let bounds = DateRange::from_attributes(&entry.attributes)
            .and_then(|range| range.bounds(period, reference));
        match bounds {
            Ok(Some(range)) => window = window.union(range),
            Ok(None) => return None,
            Err(_) => continue,
        }
    }
    Some(window)
}

/// One dashboard as seen by one (team, user). Settings are loaded once and
/// kept until they are saved again through this instance.
pub struct Dashboard {
    definition: DashboardDefinition,
    team_id: TeamId,
    user_id: UserId,
    settings: Option<DashboardSettings>,
}

impl Dashboard {
    pub fn new(definition: DashboardDefinition, team_id: TeamId, user_id: UserId) -> Self {
        Self {
            definition,
            team_id,
            user_id,
            settings: None,
        }
    }

    pub fn definition(&self) -> &DashboardDefinition {
        &self.definition
    }

    pub async fn settings(
        &mut self,
        store: &dyn SettingsStore,
        registry: &PluginRegistry,
    ) -> Result<&DashboardSettings, SettingsError> {
        if self.settings.is_none() {
            let loaded = resolve_settings(
                store,
                registry,
                &self.definition,
                self.team_id,
                self.user_id,
            )
            .await?;
            self.settings = Some(loaded);
        }
        Ok(self.settings.get_or_insert_with(DashboardSettings::default))
    }

    /// Store settings for (team, user), or the team default when `user_id` is `None`.
    pub async fn save_settings(
        &mut self,
        store: &dyn SettingsStore,
        json: &str,
        team_id: TeamId,
        user_id: Option<UserId>,
    ) -> Result<(), ServiceError> {
        serde_json::from_str::<DashboardSettings>(json).map_err(|e| {
            ServiceError::InvalidRequest(format!("invalid dashboard settings: {}", e))
        })?;

        let scope = match user_id {
            Some(user_id) => SettingScope::team_user(team_id, user_id),
            None => SettingScope::team(team_id),
        };
        store
            .set(SettingKey::dashboard(&self.definition.id, scope), json.to_string())
            .await?;
        self.settings = None;
        Ok(())
    }
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn TrackerRepository>,
    store: Arc<dyn SettingsStore>,
    registry: Arc<PluginRegistry>,
    definitions: Arc<HashMap<String, DashboardDefinition>>,
    context: ProviderContext,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn TrackerRepository>,
        store: Arc<dyn SettingsStore>,
        registry: Arc<PluginRegistry>,
        definitions: Vec<DashboardDefinition>,
        context: ProviderContext,
    ) -> Self {
        let definitions = definitions
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        Self {
            repository,
            store,
            registry,
            definitions: Arc::new(definitions),
            context,
        }
    }

    fn dashboard(
        &self,
        dashboard_id: &str,
        team_id: TeamId,
        user_id: UserId,
    ) -> Result<Dashboard, ServiceError> {
        let definition = self
            .definitions
            .get(dashboard_id)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownDashboard(dashboard_id.to_string()))?;
        Ok(Dashboard::new(definition, team_id, user_id))
    }

    pub async fn get_dashboard(
        &self,
        dashboard_id: &str,
        team_id: TeamId,
        user_id: UserId,
        period: Period,
        reference: NaiveDate,
    ) -> Result<DashboardView, ServiceError> {
        let mut dashboard = self.dashboard(dashboard_id, team_id, user_id)?;
        let settings = dashboard
            .settings(self.store.as_ref(), &self.registry)
            .await?
            .clone();

        let provider = Arc::new(
            PluginDataProvider::load(
                self.repository.as_ref(),
                &self.context,
                team_id,
                user_id,
                period,
                resolved_window(&settings, period, reference),
                reference,
            )
            .await?,
        );

        Ok(render_dashboard(
            &self.registry,
            provider,
            dashboard.definition(),
            &settings,
        ))
    }

    pub async fn save_settings(
        &self,
        dashboard_id: &str,
        json: &str,
        team_id: TeamId,
        user_id: Option<UserId>,
    ) -> Result<(), ServiceError> {
        let mut dashboard = self.dashboard(dashboard_id, team_id, user_id.unwrap_or(0))?;
        dashboard
            .save_settings(self.store.as_ref(), json, team_id, user_id)
            .await
    }
}
