// JSON file settings store implementation
use crate::application::settings_store::{SettingKey, SettingScope, SettingsError, SettingsStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Serialize, Deserialize)]
struct StoredSetting {
    setting_id: String,
    /// [user, project, team, command, command_set, service_contract]
    scope: [u32; 6],
    value: String,
}

impl StoredSetting {
    fn key(&self) -> SettingKey {
        let [user_id, project_id, team_id, command_id, command_set_id, service_contract_id] =
            self.scope;
        SettingKey {
            setting_id: self.setting_id.clone(),
            scope: SettingScope {
                user_id,
                project_id,
                team_id,
                command_id,
                command_set_id,
                service_contract_id,
            },
        }
    }

    fn from_entry(key: &SettingKey, value: &str) -> Self {
        let s = &key.scope;
        Self {
            setting_id: key.setting_id.clone(),
            scope: [
                s.user_id,
                s.project_id,
                s.team_id,
                s.command_id,
                s.command_set_id,
                s.service_contract_id,
            ],
            value: value.to_string(),
        }
    }
}

/// Settings kept in memory and, when a path is given, written through to a JSON file.
pub struct FileSettingsStore {
    path: Option<PathBuf>,
    values: RwLock<HashMap<SettingKey, String>>,
}

impl FileSettingsStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: RwLock::new(HashMap::new()),
        }
    }

    pub async fn open(path: PathBuf) -> Result<Self, SettingsError> {
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let entries: Vec<StoredSetting> = serde_json::from_str(&raw)?;
                entries.into_iter().map(|e| (e.key(), e.value)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings file at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    async fn persist(&self, values: &HashMap<SettingKey, String>) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut entries: Vec<StoredSetting> = values
            .iter()
            .map(|(k, v)| StoredSetting::from_entry(k, v))
            .collect();
        entries.sort_by(|a, b| (&a.setting_id, a.scope).cmp(&(&b.setting_id, b.scope)));

        let raw = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &SettingKey) -> Result<Option<String>, SettingsError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: SettingKey, value: String) -> Result<(), SettingsError> {
        let mut values = self.values.write().await;
        tracing::debug!("Storing setting {}", key);
        // memory only changes once the file is written
        let mut updated = values.clone();
        updated.insert(key, value);
        self.persist(&updated).await?;
        *values = updated;
        Ok(())
    }
}
