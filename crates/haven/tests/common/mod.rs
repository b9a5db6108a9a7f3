//! Shared test harness: a full router over temporary data and homes
//! directories, with system-user provisioning disabled.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::{Router, body::to_bytes};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use haven::{AppConfig, AppState, api};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    _data: TempDir,
    _homes: TempDir,
}

/// Build a test app with default configuration.
pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

/// Build a test app, letting the caller tweak the configuration first.
pub async fn test_app_with(customize: impl FnOnce(&mut AppConfig)) -> TestApp {
    let data = tempfile::tempdir().unwrap();
    let homes = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.auth.session_secret = Some(TEST_SECRET.to_string());
    config.paths.data_dir = data.path().to_path_buf();
    config.paths.homes_dir = homes.path().to_path_buf();
    config.accounts.provision_system_users = false;

    customize(&mut config);
    config.validate().unwrap();

    let state = AppState::new(config).unwrap();
    state.init().await.unwrap();

    TestApp {
        app: api::create_router(state.clone()),
        state,
        _data: data,
        _homes: homes,
    }
}

/// POST a JSON body, optionally bearer-authenticated.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// GET a URI, optionally bearer-authenticated.
pub async fn get_json(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(Method::GET);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = builder.body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

/// Register a user and return their session token.
pub async fn register(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/auth/register",
        serde_json::json!({ "username": username, "password": password }),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "registration failed: {body}");

    body["token"].as_str().unwrap().to_string()
}
