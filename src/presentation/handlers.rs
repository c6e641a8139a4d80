// HTTP request handlers
use crate::application::error::ServiceError;
use crate::application::gantt_service::Period;
use crate::domain::gantt::Timeline;
use crate::domain::issue::{IssueId, UserId};
use crate::domain::team::{TeamId, UserDirectory};
use crate::infrastructure::http_response::json_response;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub team: TeamId,
    pub user: Option<UserId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct SettingsQuery {
    pub team: TeamId,
    pub user: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct ActivityDto {
    pub issue_id: IssueId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserActivitiesDto {
    pub user_id: UserId,
    pub user_name: String,
    pub activities: Vec<ActivityDto>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Render a dashboard for a team member
pub async fn get_dashboard(
    Path(id): Path<String>,
    Query(query): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let reference = today();
    let result = match Period::resolve(query.start, query.end, reference) {
        Ok(period) => {
            state
                .dashboard_service
                .get_dashboard(&id, query.team, query.user.unwrap_or(0), period, reference)
                .await
        }
        Err(e) => Err(e),
    };
    json_response(result)
}

/// Save dashboard settings for a team member, or for the team when no user is given
pub async fn save_dashboard_settings(
    Path(id): Path<String>,
    Query(query): Query<SettingsQuery>,
    State(state): State<Arc<AppState>>,
    body: String,
) -> Response {
    match state
        .dashboard_service
        .save_settings(&id, &body, query.team, query.user)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Gantt chart document for a team
pub async fn team_gantt(
    Path(team_id): Path<TeamId>,
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let reference = today();
    let result = match Period::resolve(query.start, query.end, reference) {
        Ok(period) => {
            state
                .gantt_service
                .gantt_graph(team_id, period, reference)
                .await
        }
        Err(e) => Err(e),
    };
    json_response(result)
}

/// Per-user activities of a team
pub async fn team_activities(
    Path(team_id): Path<TeamId>,
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    json_response(load_activities(&state, team_id, query).await)
}

async fn load_activities(
    state: &AppState,
    team_id: TeamId,
    query: RangeQuery,
) -> Result<Vec<UserActivitiesDto>, ServiceError> {
    let reference = today();
    let period = Period::resolve(query.start, query.end, reference)?;
    let (_, timeline) = state
        .gantt_service
        .team_activities(team_id, period, reference)
        .await?;
    let users = state.gantt_service.users(team_id).await?;
    Ok(timeline_to_dto(&timeline, &users))
}

fn timeline_to_dto(timeline: &Timeline, users: &UserDirectory) -> Vec<UserActivitiesDto> {
    timeline
        .lanes()
        .map(|(user_id, activities)| UserActivitiesDto {
            user_id,
            user_name: users.display_name(user_id),
            activities: activities
                .iter()
                .map(|a| ActivityDto {
                    issue_id: a.issue_id,
                    start: a.start,
                    end: a.end,
                    progress: a.progress,
                    color: a.color().map(str::to_string),
                })
                .collect(),
        })
        .collect()
}
