// Errors surfaced by the application services
use crate::application::settings_store::SettingsError;
use crate::domain::team::TeamId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unknown dashboard: {0}")]
    UnknownDashboard(String),

    #[error("unknown team: {0}")]
    UnknownTeam(TeamId),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("issue tracker query failed: {0}")]
    Tracker(#[from] anyhow::Error),
}
