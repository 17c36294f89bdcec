// Library root - the server binary and the integration tests both build on this

pub mod app_state;
pub mod background;
pub mod config;
pub mod database;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod modules;
pub mod services;

pub use app_state::AppState;
pub use config::Config;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// All HTTP routes. CORS is limited to the configured front-end origins.
pub fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/modules", get(handlers::list_modules))
        .route("/api/modules/:module_id/sync", post(handlers::sync_module))
        .route(
            "/api/modules/:module_id/config",
            get(handlers::get_module_config).post(handlers::upsert_module_config),
        )
        .route("/api/modules/:module_id/test", post(handlers::test_module_config))
        .route("/api/widgets", get(handlers::list_widgets))
        .route(
            "/api/widget-data/:module_id/:widget_id",
            get(handlers::get_widget_data),
        )
        .route(
            "/api/dashboards/:dashboard_id",
            get(handlers::get_dashboard).post(handlers::upsert_dashboard),
        )
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({"status": "ok"}))
}
