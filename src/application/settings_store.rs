// Store trait for persisted configuration values
use crate::domain::issue::UserId;
use crate::domain::team::TeamId;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub const DASHBOARD_SETTING_PREFIX: &str = "dashboard_";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Scope a value applies to. A zero id means "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SettingScope {
    pub user_id: UserId,
    pub project_id: u32,
    pub team_id: TeamId,
    pub command_id: u32,
    pub command_set_id: u32,
    pub service_contract_id: u32,
}

impl SettingScope {
    pub fn team(team_id: TeamId) -> Self {
        Self {
            team_id,
            ..Self::default()
        }
    }

    pub fn team_user(team_id: TeamId, user_id: UserId) -> Self {
        Self {
            user_id,
            team_id,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingKey {
    pub setting_id: String,
    pub scope: SettingScope,
}

impl SettingKey {
    pub fn dashboard(dashboard_id: &str, scope: SettingScope) -> Self {
        Self {
            setting_id: format!("{}{}", DASHBOARD_SETTING_PREFIX, dashboard_id),
            scope,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.scope;
        write!(
            f,
            "{}[{},{},{},{},{},{}]",
            self.setting_id,
            s.user_id,
            s.project_id,
            s.team_id,
            s.command_id,
            s.command_set_id,
            s.service_contract_id
        )
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &SettingKey) -> Result<Option<String>, SettingsError>;

    async fn set(&self, key: SettingKey, value: String) -> Result<(), SettingsError>;
}
