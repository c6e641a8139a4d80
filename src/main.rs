// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::gantt_service::GanttService;
use crate::application::indicators::builtin_registry;
use crate::application::settings_store::SettingsStore;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::settings_store::FileSettingsStore;
use crate::infrastructure::tracker_repository::FileTrackerRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_dashboard, health_check, save_dashboard_settings, team_activities, team_gantt,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;
    let statuses = config.status_catalog();

    // Create adapters (infrastructure layer)
    let repository = Arc::new(FileTrackerRepository::load(
        &config.data.tracker_path,
        statuses.clone(),
    )?);
    let settings_store: Arc<dyn SettingsStore> = match &config.data.settings_path {
        Some(path) => Arc::new(FileSettingsStore::open(path.clone()).await?),
        None => {
            tracing::warn!("No settings path configured, dashboard settings are not persisted");
            Arc::new(FileSettingsStore::in_memory())
        }
    };

    // Create services (application layer)
    let registry = Arc::new(builtin_registry());
    let dashboard_service = DashboardService::new(
        repository.clone(),
        settings_store,
        registry,
        config.dashboards.clone(),
        config.provider_context(),
    );
    let gantt_service = GanttService::new(
        repository,
        statuses,
        config.work_calendar(),
        config.gantt_options(),
    );

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        gantt_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards/:id", get(get_dashboard))
        .route("/dashboards/:id/settings", put(save_dashboard_settings))
        .route("/teams/:id/gantt", get(team_gantt))
        .route("/teams/:id/activities", get(team_activities))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting codevtt-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
