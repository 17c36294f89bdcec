//! HTTP surface: routing, status mapping and config round trips.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use synapsesync::modules::registry::ModuleFactory;
use synapsesync::modules::{Module, ModuleContext, ModuleRegistry};
use synapsesync::{build_router, AppState};

use test_helpers::*;

async fn app(api: Arc<StubGitHubApi>) -> Router {
    let db_pool = setup_test_db().await;
    let config = Arc::new(test_config());
    let factory: ModuleFactory =
        Box::new(move |ctx: &ModuleContext| -> anyhow::Result<Arc<dyn Module>> {
            Ok(Arc::new(github_module(
                &ctx.db_pool,
                test_config(),
                api.clone(),
                StubExport::Empty,
            )))
        });
    let registry = ModuleRegistry::new(
        ModuleContext {
            db_pool: db_pool.clone(),
            config: config.clone(),
        },
        vec![factory],
    );
    build_router(AppState::with_registry(db_pool, config, Arc::new(registry)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(Arc::new(StubGitHubApi::default())).await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn lists_modules_and_widgets() {
    let app = app(Arc::new(StubGitHubApi::default())).await;

    let (status, modules) = send(&app, Method::GET, "/api/modules", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(modules[0]["id"], "github");
    assert_eq!(modules[0]["widgets"].as_array().unwrap().len(), 4);

    let (status, widgets) = send(&app, Method::GET, "/api/widgets", None).await;
    assert_eq!(status, StatusCode::OK);
    let first = &widgets[0];
    assert_eq!(first["module_id"], "github");
    assert_eq!(first["id"], "recent_activity");
    assert_eq!(first["visual_type"], "timeline");
}

#[tokio::test]
async fn unknown_module_is_404_everywhere() {
    let app = app(Arc::new(StubGitHubApi::default())).await;

    for (method, uri) in [
        (Method::POST, "/api/modules/gitlab/sync"),
        (Method::GET, "/api/modules/gitlab/config"),
        (Method::GET, "/api/widget-data/gitlab/events_7d"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "Unknown module");
    }
}

#[tokio::test]
async fn unknown_widget_is_a_successful_sentinel() {
    let app = app(Arc::new(StubGitHubApi::default())).await;
    let (status, body) = send(&app, Method::GET, "/api/widget-data/github/nope", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"visual_type": "unknown", "data": null}));
}

#[tokio::test]
async fn widget_data_forwards_query_params() {
    let app = app(Arc::new(StubGitHubApi::default())).await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/widget-data/github/recent_activity?limit=5",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"visual_type": "timeline", "data": []}));
}

#[tokio::test]
async fn sync_without_credentials_is_ok() {
    let api = Arc::new(StubGitHubApi::default());
    let app = app(api.clone()).await;

    let (status, body) = send(&app, Method::POST, "/api/modules/github/sync", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "inserted": 0, "skipped": 0}));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn upstream_failure_is_a_400() {
    let app = app(Arc::new(StubGitHubApi::failing("502 Bad Gateway"))).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/modules/github/config",
        Some(json!({"config_json": {"username": "octocat"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/api/modules/github/sync", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("502"));
}

#[tokio::test]
async fn config_is_validated_then_stored() {
    let app = app(Arc::new(StubGitHubApi::default())).await;

    let (status, body) = send(&app, Method::GET, "/api/modules/github/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"module_id": "github", "config_json": {}}));

    for (config, message) in [
        (json!({"provider": "ftp"}), "github.provider must be 'api' or 'hpi'"),
        (json!({"provider": "api"}), "github.username is required"),
        (json!({"username": "me", "token": "short"}), "github.token looks too short"),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/modules/github/config",
            Some(json!({ "config_json": config })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], message);
    }

    let saved = json!({"provider": "hpi", "hpi_path": "/tmp/export.json"});
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/modules/github/config",
        Some(json!({ "config_json": saved })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/modules/github/config", None).await;
    assert_eq!(body["config_json"], saved);
}

#[tokio::test]
async fn test_endpoint_probes_with_payload_or_stored_config() {
    let api = Arc::new(StubGitHubApi::default());
    let app = app(api.clone()).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/modules/github/test",
        Some(json!({"config_json": {"username": "octocat", "token": "ghp_0123456789"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    // Nothing stored yet: the empty config fails validation.
    let (status, body) = send(&app, Method::POST, "/api/modules/github/test", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "github.username is required");

    // The stub export is empty, which counts as reachable.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/modules/github/test",
        Some(json!({"config_json": {"provider": "hpi"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        api.calls(),
        vec![("octocat".to_string(), Some("ghp_0123456789".to_string()))]
    );
}

#[tokio::test]
async fn dashboards_default_then_round_trip() {
    let app = app(Arc::new(StubGitHubApi::default())).await;

    let (status, body) = send(&app, Method::GET, "/api/dashboards/main", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "main", "config_json": {"widgets": []}}));

    let layout = json!({"widgets": [{"module_id": "github", "widget_id": "events_7d"}]});
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/dashboards/main",
        Some(json!({ "config_json": layout })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/dashboards/main", None).await;
    assert_eq!(body["config_json"], layout);
    assert!(body["updated_at"].is_string());
}
