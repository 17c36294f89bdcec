use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::{database_error, ApiError};
use crate::models::Dashboard;
use crate::services::dashboards;
use crate::AppState;

#[derive(Deserialize)]
pub struct DashboardPayload {
    pub config_json: Value,
}

pub async fn get_dashboard(
    Path(dashboard_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>, ApiError> {
    let dashboard = dashboards::get_dashboard(&state.db_pool, &dashboard_id)
        .await
        .map_err(database_error)?;
    Ok(Json(dashboard))
}

pub async fn upsert_dashboard(
    Path(dashboard_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<DashboardPayload>,
) -> Result<Json<Value>, ApiError> {
    dashboards::upsert_dashboard(&state.db_pool, &dashboard_id, &payload.config_json)
        .await
        .map_err(database_error)?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}
