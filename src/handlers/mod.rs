pub mod dashboards;
pub mod modules;
pub mod widgets;

use axum::{http::StatusCode, response::Json};
use serde_json::Value;

use crate::modules::ModuleError;

pub use dashboards::{get_dashboard, upsert_dashboard, DashboardPayload};
pub use modules::{
    get_module_config, list_modules, sync_module, test_module_config, upsert_module_config,
    ModuleConfigPayload, ModuleInfo,
};
pub use widgets::{get_widget_data, list_widgets, ModuleWidget};

pub type ApiError = (StatusCode, Json<Value>);

fn error_body(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

/// Map a module failure onto a response, keeping the error kind visible to the client.
pub fn module_error(err: ModuleError) -> ApiError {
    match err {
        ModuleError::UnknownModule(_) => error_body(StatusCode::NOT_FOUND, "Unknown module"),
        ModuleError::Store(e) => {
            tracing::error!("Database error: {:?}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
        ModuleError::Registry(e) => {
            tracing::error!("Module registry error: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        other => {
            tracing::warn!("Module request failed: {}", other);
            error_body(StatusCode::BAD_REQUEST, other.to_string())
        }
    }
}

pub fn database_error(err: sqlx::Error) -> ApiError {
    tracing::error!("Database error: {:?}", err);
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::HpiError;

    #[test]
    fn error_kinds_map_to_statuses() {
        let (status, Json(body)) = module_error(ModuleError::UnknownModule("x".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown module");

        let (status, Json(body)) = module_error(ModuleError::InvalidConfig(
            "github.username is required".into(),
        ));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "github.username is required");

        let (status, _) = module_error(ModuleError::HpiUnavailable(HpiError::NotConfigured));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = module_error(ModuleError::Store(sqlx::Error::RowNotFound));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
