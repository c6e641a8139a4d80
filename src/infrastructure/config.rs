use crate::application::data_provider::ProviderContext;
use crate::application::gantt_service::GanttOptions;
use crate::domain::calendar::WorkCalendar;
use crate::domain::dashboard::DashboardDefinition;
use crate::domain::status::{StatusCatalog, StatusId};
use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

const ENV_PREFIX: &str = "CODEVTT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("dashboard id {0} is defined more than once")]
    DuplicateDashboard(String),

    #[error("calendar has no working day")]
    NoWorkingDays,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub statuses: StatusSettings,
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub gantt: GanttSettings,
    pub data: DataSettings,
    #[serde(default)]
    pub dashboards: Vec<DashboardDefinition>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusSettings {
    pub new: u32,
    pub acknowledged: u32,
    pub resolved: u32,
    pub closed: u32,
    pub feedback: Option<u32>,
    pub analyzed: Option<u32>,
    pub accepted: Option<u32>,
    pub opened: Option<u32>,
    pub deferred: Option<u32>,
    pub delivered: Option<u32>,
    /// Defaults to the resolved status
    pub resolved_threshold: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalendarSettings {
    #[serde(default = "default_non_working_days")]
    pub non_working_days: Vec<Weekday>,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            non_working_days: default_non_working_days(),
            holidays: Vec::new(),
        }
    }
}

fn default_non_working_days() -> Vec<Weekday> {
    vec![Weekday::Sat, Weekday::Sun]
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GanttSettings {
    pub resolved_color: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSettings {
    pub tracker_path: PathBuf,
    pub settings_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = HashSet::new();
        for dashboard in &self.dashboards {
            if !ids.insert(dashboard.id.as_str()) {
                return Err(ConfigError::DuplicateDashboard(dashboard.id.clone()));
            }
        }
        if !self.work_calendar().has_working_days() {
            return Err(ConfigError::NoWorkingDays);
        }
        Ok(())
    }

    pub fn status_catalog(&self) -> StatusCatalog {
        let s = &self.statuses;
        StatusCatalog {
            new: StatusId(s.new),
            acknowledged: StatusId(s.acknowledged),
            resolved: StatusId(s.resolved),
            closed: StatusId(s.closed),
            feedback: s.feedback.map(StatusId),
            analyzed: s.analyzed.map(StatusId),
            accepted: s.accepted.map(StatusId),
            opened: s.opened.map(StatusId),
            deferred: s.deferred.map(StatusId),
            delivered: s.delivered.map(StatusId),
            resolved_threshold: StatusId(s.resolved_threshold.unwrap_or(s.resolved)),
        }
    }

    pub fn work_calendar(&self) -> WorkCalendar {
        WorkCalendar::new(
            self.calendar.non_working_days.clone(),
            self.calendar.holidays.clone(),
        )
    }

    pub fn gantt_options(&self) -> GanttOptions {
        GanttOptions {
            resolved_color: self.gantt.resolved_color.clone(),
        }
    }

    pub fn provider_context(&self) -> ProviderContext {
        ProviderContext {
            statuses: self.status_catalog(),
            calendar: self.work_calendar(),
            gantt: self.gantt_options(),
        }
    }
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/codevtt"))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::{PluginCategory, PluginDomain};
    use config::{Config, File, FileFormat};

    const SAMPLE: &str = r#"
        [statuses]
        new = 10
        feedback = 20
        acknowledged = 30
        resolved = 80
        closed = 90

        [calendar]
        non_working_days = ["Sat", "Sun"]
        holidays = ["2024-12-25"]

        [gantt]
        resolved_color = "grey"

        [data]
        tracker_path = "data/tracker.json"

        [[dashboards]]
        id = "homepage_main"
        domain = "homepage"
        categories = ["quality", "planning"]
        title = "My dashboard"
    "#;

    fn parse(source: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let config = parse(SAMPLE);
        config.validate().unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.data.settings_path, None);
        assert_eq!(config.dashboards[0].domain, PluginDomain::Homepage);
        assert_eq!(
            config.dashboards[0].categories,
            vec![PluginCategory::Quality, PluginCategory::Planning]
        );

        let catalog = config.status_catalog();
        assert_eq!(catalog.resolved_threshold, StatusId(80));
        assert_eq!(catalog.feedback, Some(StatusId(20)));
        assert_eq!(catalog.delivered, None);

        let holiday = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(config.work_calendar().capacity_on(holiday), 0.0);
        assert_eq!(config.gantt_options().resolved_color.as_deref(), Some("grey"));
    }

    #[test]
    fn test_duplicate_dashboard_ids_rejected() {
        let source = format!(
            "{}\n[[dashboards]]\nid = \"homepage_main\"\ndomain = \"team\"\ncategories = []\ntitle = \"again\"\n",
            SAMPLE
        );
        let config = parse(&source);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateDashboard(id)) if id == "homepage_main"
        ));
    }

    #[test]
    fn test_calendar_without_working_days_rejected() {
        let source = SAMPLE.replace(
            r#"non_working_days = ["Sat", "Sun"]"#,
            r#"non_working_days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]"#,
        );
        let config = parse(&source);
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkingDays)));
    }
}
