// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::gantt_service::GanttService;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub gantt_service: GanttService,
}
