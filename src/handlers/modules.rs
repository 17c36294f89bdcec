use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{database_error, module_error, ApiError};
use crate::models::WidgetDescriptor;
use crate::modules::SyncReport;
use crate::services::module_configs;
use crate::AppState;

#[derive(Serialize)]
pub struct ModuleInfo {
    pub id: String,
    pub widgets: Vec<WidgetDescriptor>,
}

#[derive(Deserialize)]
pub struct ModuleConfigPayload {
    pub config_json: Value,
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: SyncReport,
}

pub async fn list_modules(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModuleInfo>>, ApiError> {
    let modules = state
        .registry
        .load_modules()
        .map_err(|e| module_error(e.into()))?;

    Ok(Json(
        modules
            .values()
            .map(|m| ModuleInfo {
                id: m.id().to_string(),
                widgets: m.get_widgets(),
            })
            .collect(),
    ))
}

pub async fn sync_module(
    Path(module_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SyncResponse>, ApiError> {
    let module = state.registry.get_module(&module_id).map_err(module_error)?;
    let report = module.sync().await.map_err(module_error)?;
    Ok(Json(SyncResponse {
        status: "ok",
        report,
    }))
}

pub async fn get_module_config(
    Path(module_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state.registry.get_module(&module_id).map_err(module_error)?;

    let stored = module_configs::get_module_config(&state.db_pool, &module_id)
        .await
        .map_err(database_error)?;
    let config_json = stored
        .map(|c| c.config)
        .unwrap_or_else(|| serde_json::json!({}));

    Ok(Json(serde_json::json!({
        "module_id": module_id,
        "config_json": config_json,
    })))
}

pub async fn upsert_module_config(
    Path(module_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ModuleConfigPayload>,
) -> Result<Json<Value>, ApiError> {
    let module = state.registry.get_module(&module_id).map_err(module_error)?;
    module
        .validate_config(&payload.config_json)
        .map_err(module_error)?;

    module_configs::upsert_module_config(&state.db_pool, &module_id, &payload.config_json)
        .await
        .map_err(database_error)?;

    Ok(Json(serde_json::json!({"status": "ok"})))
}

/// Probe a config without saving it. Without a body the stored config is tested.
pub async fn test_module_config(
    Path(module_id): Path<String>,
    State(state): State<AppState>,
    payload: Option<Json<ModuleConfigPayload>>,
) -> Result<Json<Value>, ApiError> {
    let module = state.registry.get_module(&module_id).map_err(module_error)?;

    let config_json = match payload {
        Some(Json(payload)) => payload.config_json,
        None => module_configs::get_module_config(&state.db_pool, &module_id)
            .await
            .map_err(database_error)?
            .map(|c| c.config)
            .unwrap_or_else(|| serde_json::json!({})),
    };

    module
        .test_connection(&config_json)
        .await
        .map_err(module_error)?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}
