//! Integration tests for API endpoints.
//!
//! These tests drive the real router, services and repository against an
//! in-memory SQLite database.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use users_api::api::middleware::cors_layer;
use users_api::api::{create_router, AppState};
use users_api::infra::Database;

// =============================================================================
// Test Helpers
// =============================================================================

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    create_router(AppState::from_database(Arc::new(db)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn create(app: &Router, name: &str, email: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/users/",
        Some(json!({ "name": name, "email": email })),
    )
    .await
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_user() {
    let app = test_app().await;

    let (status, body) = create(&app, "Alice", "alice@example.com").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body["id"].as_str().and_then(|id| Uuid::parse_str(id).ok()).is_some());
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn test_create_duplicate_email() {
    let app = test_app().await;

    create(&app, "Alice", "alice@example.com").await;
    let (status, body) = create(&app, "Bob", "alice@example.com").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["detail"],
        "User with email alice@example.com already exists"
    );
}

#[tokio::test]
async fn test_create_without_trailing_slash() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "name": "Alice", "email": "alice@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_rejects_invalid_body() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::POST, "/users/", Some(json!({ "name": "Alice" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let (status, body) = create(&app, &"x".repeat(256), "alice@example.com").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "name must be at most 255 characters");

    let (status, _) = create(&app, "Alice", &format!("{}@example.com", "x".repeat(250))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_accepts_any_bounded_email_string() {
    let app = test_app().await;

    let (status, body) = create(&app, "Bob", "bob").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "bob");
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn test_list_users() {
    let app = test_app().await;

    create(&app, "Alice", "alice@example.com").await;
    create(&app, "Bob", "bob@example.com").await;
    create(&app, "Carol", "carol@example.com").await;

    let (status, body) = send(&app, Method::GET, "/users/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_list_users_empty() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/users", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_get_user() {
    let app = test_app().await;
    let (_, created) = create(&app, "Alice", "alice@example.com").await;
    let user_id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/users/{}", user_id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}

#[tokio::test]
async fn test_get_user_not_found() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/users/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["detail"],
        "User 00000000-0000-0000-0000-000000000000 not found"
    );
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_user_name_only() {
    let app = test_app().await;
    let (_, created) = create(&app, "Alice", "alice@example.com").await;
    let uri = format!("/users/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "name": "Alice Updated" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Updated");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["created_at"], created["created_at"]);
}

#[tokio::test]
async fn test_update_email_conflicts_with_other_user() {
    let app = test_app().await;
    create(&app, "Alice", "alice@example.com").await;
    let (_, bob) = create(&app, "Bob", "bob@example.com").await;
    let uri = format!("/users/{}", bob["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "email": "alice@example.com" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, unchanged) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(unchanged["email"], "bob@example.com");
}

#[tokio::test]
async fn test_update_to_own_email_succeeds() {
    let app = test_app().await;
    let (_, alice) = create(&app, "Alice", "alice@example.com").await;
    let uri = format!("/users/{}", alice["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "name": "Alice", "email": "alice@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn test_update_changes_email() {
    let app = test_app().await;
    let (_, alice) = create(&app, "Alice", "alice@example.com").await;
    let uri = format!("/users/{}", alice["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "email": "alice@new.example.com" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@new.example.com");
    assert_eq!(body["name"], "Alice");

    // The old address is free again
    let (status, _) = create(&app, "Other", "alice@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_update_rejects_null_field() {
    let app = test_app().await;
    let (_, alice) = create(&app, "Alice", "alice@example.com").await;
    let uri = format!("/users/{}", alice["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "name": null }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "name may not be null");
}

#[tokio::test]
async fn test_update_missing_user() {
    let app = test_app().await;
    let uri = format!("/users/{}", Uuid::new_v4());

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "name": "Ghost" }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_user() {
    let app = test_app().await;
    let (_, created) = create(&app, "Alice", "alice@example.com").await;
    let uri = format!("/users/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Delete is not idempotent
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_user_lifecycle_scenario() {
    let app = test_app().await;

    let (status, alice) = create(&app, "Alice", "alice@x.com").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = create(&app, "Bob", "alice@x.com").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/users/{}", alice["id"].as_str().unwrap());
    let (status, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, alice);

    let (status, patched) = send(&app, Method::PATCH, &uri, Some(json!({ "name": "Alice2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["name"], "Alice2");
    assert_eq!(patched["email"], "alice@x.com");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Ambient endpoints
// =============================================================================

#[tokio::test]
async fn test_health_reports_database() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/users/"].is_object());
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let app = test_app()
        .await
        .layer(cors_layer(&["http://localhost:3000".to_string()]));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/users/")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}
