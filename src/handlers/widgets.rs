use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use super::{module_error, ApiError};
use crate::models::{WidgetData, WidgetDescriptor, WidgetParams};
use crate::AppState;

#[derive(Serialize)]
pub struct ModuleWidget {
    pub module_id: String,
    #[serde(flatten)]
    pub widget: WidgetDescriptor,
}

/// Every widget of every registered module.
pub async fn list_widgets(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModuleWidget>>, ApiError> {
    let modules = state
        .registry
        .load_modules()
        .map_err(|e| module_error(e.into()))?;

    let widgets = modules
        .values()
        .flat_map(|module| {
            let module_id = module.id().to_string();
            module
                .get_widgets()
                .into_iter()
                .map(move |widget| ModuleWidget {
                    module_id: module_id.clone(),
                    widget,
                })
        })
        .collect();

    Ok(Json(widgets))
}

/// Query string parameters are forwarded to the module as string values.
pub async fn get_widget_data(
    Path((module_id, widget_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<WidgetData>, ApiError> {
    let module = state.registry.get_module(&module_id).map_err(module_error)?;

    let params: WidgetParams = query
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    let data = module
        .get_widget_data(&widget_id, &params)
        .await
        .map_err(module_error)?;
    Ok(Json(data))
}
