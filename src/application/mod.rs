// Application layer - Use cases, plugin registry and ports to external stores
pub mod dashboard_service;
pub mod data_provider;
pub mod error;
pub mod gantt_service;
pub mod indicators;
pub mod plugin;
pub mod settings_store;
pub mod tracker_repository;
