//! Integration tests for admin authentication: login, sessions, password
//! reset, throttling and the maintenance endpoint.

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use zaroda_server::{
    api::AppState, auth::is_bcrypt_hash, config::AuthConfig, create_test_app,
    create_test_app_with, db, TEST_SERVICE_KEY,
};

async fn setup() -> (TestServer, Arc<AppState>) {
    let (app, state) = create_test_app().await;
    (TestServer::new(app).unwrap(), state)
}

async fn setup_with(auth_config: AuthConfig) -> (TestServer, Arc<AppState>) {
    let (app, state) = create_test_app_with(auth_config).await;
    (TestServer::new(app).unwrap(), state)
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn service_key_header() -> HeaderName {
    HeaderName::from_static("x-service-key")
}

async fn stored_hash(state: &AppState, username: &str) -> String {
    db::admins::find_by_username(&state.pool, username)
        .await
        .unwrap()
        .unwrap()
        .password_hash
}

async fn login(server: &TestServer, username: &str, password: &str) -> axum_test::TestResponse {
    server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await
}

async fn login_token(server: &TestServer, username: &str, password: &str) -> String {
    let response = login(server, username, password).await;
    response.assert_status_ok();
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

// ============================================================================
// Legacy Credential Tests
// ============================================================================

#[tokio::test]
async fn test_legacy_password_is_migrated_on_login() {
    let (server, state) = setup().await;
    db::admins::insert(&state.pool, "legacy", "plain-secret", None)
        .await
        .unwrap();

    login(&server, "legacy", "plain-secret").await.assert_status_ok();

    let hash = stored_hash(&state, "legacy").await;
    assert!(is_bcrypt_hash(&hash));
    assert!(bcrypt::verify("plain-secret", &hash).unwrap());

    // Still works against the migrated hash
    login(&server, "legacy", "plain-secret").await.assert_status_ok();
}

#[tokio::test]
async fn test_legacy_password_refused_when_migration_disabled() {
    let (server, state) = setup_with(AuthConfig {
        service_role_key: TEST_SERVICE_KEY.to_string(),
        legacy_password_migration: false,
    })
    .await;
    db::admins::insert(&state.pool, "legacy", "plain-secret", None)
        .await
        .unwrap();

    let response = login(&server, "legacy", "plain-secret").await;
    response.assert_status_unauthorized();
    assert_eq!(
        response.json::<Value>()["error"],
        "Password must be reset with the hash-admin-password tool"
    );
    assert_eq!(stored_hash(&state, "legacy").await, "plain-secret");
}

#[tokio::test]
async fn test_wrong_legacy_password_is_rejected() {
    let (server, state) = setup().await;
    db::admins::insert(&state.pool, "legacy", "plain-secret", None)
        .await
        .unwrap();

    let response = login(&server, "legacy", "plain-secreT").await;
    response.assert_status_unauthorized();
    assert_eq!(stored_hash(&state, "legacy").await, "plain-secret");
}

// ============================================================================
// Throttling Tests
// ============================================================================

#[tokio::test]
async fn test_login_throttled_after_burst() {
    let (server, state) = setup().await;
    let hash = bcrypt::hash("Secret123", 4).unwrap();
    db::admins::insert(&state.pool, "officer", &hash, None)
        .await
        .unwrap();

    for _ in 0..5 {
        login(&server, "officer", "wrong").await.assert_status_unauthorized();
    }

    let response = login(&server, "Officer", "Secret123").await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);

    // Other usernames have their own budget
    login(&server, "someone-else", "wrong")
        .await
        .assert_status_unauthorized();
}

// ============================================================================
// Password Reset Tests
// ============================================================================

async fn officer(server: &TestServer, state: &AppState) -> String {
    let hash = bcrypt::hash("Secret123", 4).unwrap();
    db::admins::insert(&state.pool, "officer", &hash, Some("officer@zaroda.test".to_string()))
        .await
        .unwrap();
    login_token(server, "officer", "Secret123").await
}

#[tokio::test]
async fn test_reset_password_validation_leaves_store_untouched() {
    let (server, state) = setup().await;
    let token = officer(&server, &state).await;
    let before = stored_hash(&state, "officer").await;

    let cases = [
        (json!({ "current_password": "", "new_password": "abcdef", "confirm_password": "abcdef" }), "All fields are required"),
        (json!({ "current_password": "Secret123", "new_password": "abcdef", "confirm_password": "abcdeg" }), "Passwords do not match"),
        (json!({ "current_password": "Secret123", "new_password": "abc", "confirm_password": "abc" }), "Password must be at least 6 characters"),
        (json!({ "current_password": "nope", "new_password": "abcdef", "confirm_password": "abcdef" }), "Invalid current password"),
    ];

    for (body, message) in cases {
        let response = server
            .post("/api/auth/reset-password")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&body)
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"], message);
    }

    assert_eq!(stored_hash(&state, "officer").await, before);
}

#[tokio::test]
async fn test_reset_password_success_ends_session() {
    let (server, state) = setup().await;
    let token = officer(&server, &state).await;

    let response = server
        .post("/api/auth/reset-password")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "current_password": "Secret123",
            "new_password": "NewSecret456",
            "confirm_password": "NewSecret456"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["reset_summary"]["username"], "officer");
    assert_eq!(body["reset_summary"]["admin_notified"], true);
    assert!(body["reset_summary"]["reset_date"].is_string());

    // The old session no longer works
    server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status_unauthorized();

    login(&server, "officer", "Secret123").await.assert_status_unauthorized();
    login(&server, "officer", "NewSecret456").await.assert_status_ok();
}

#[tokio::test]
async fn test_reset_password_requires_session() {
    let (server, _) = setup().await;

    let response = server
        .post("/api/auth/reset-password")
        .json(&json!({
            "current_password": "Secret123",
            "new_password": "NewSecret456",
            "confirm_password": "NewSecret456"
        }))
        .await;
    response.assert_status_unauthorized();
}

// ============================================================================
// Maintenance Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_maintenance_rejects_wrong_key() {
    let (server, state) = setup().await;
    db::admins::insert(&state.pool, "officer", "plain", None)
        .await
        .unwrap();
    let hash = bcrypt::hash("Secret123", 4).unwrap();

    let response = server
        .put("/api/admin/maintenance/password")
        .add_header(service_key_header(), HeaderValue::from_static("wrong_key"))
        .json(&json!({ "username": "officer", "password_hash": hash }))
        .await;
    response.assert_status_unauthorized();

    let response = server
        .put("/api/admin/maintenance/password")
        .json(&json!({ "username": "officer", "password_hash": hash }))
        .await;
    response.assert_status_unauthorized();

    assert_eq!(stored_hash(&state, "officer").await, "plain");
}

#[tokio::test]
async fn test_maintenance_validates_request() {
    let (server, state) = setup().await;
    db::admins::insert(&state.pool, "officer", "plain", None)
        .await
        .unwrap();

    let response = server
        .put("/api/admin/maintenance/password")
        .add_header(service_key_header(), HeaderValue::from_static(TEST_SERVICE_KEY))
        .json(&json!({ "username": "officer", "password_hash": "not-a-hash" }))
        .await;
    response.assert_status_bad_request();

    let hash = bcrypt::hash("Secret123", 4).unwrap();
    let response = server
        .put("/api/admin/maintenance/password")
        .add_header(service_key_header(), HeaderValue::from_static(TEST_SERVICE_KEY))
        .json(&json!({ "username": "nobody", "password_hash": hash }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_maintenance_sets_hash() {
    let (server, state) = setup().await;
    db::admins::insert(&state.pool, "officer", "plain", None)
        .await
        .unwrap();
    let hash = bcrypt::hash("Secret123", 4).unwrap();

    let response = server
        .put("/api/admin/maintenance/password")
        .add_header(service_key_header(), HeaderValue::from_static(TEST_SERVICE_KEY))
        .json(&json!({ "username": "officer", "password_hash": hash }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["username"], "officer");
    assert!(body.get("password_hash").is_none());
    assert_eq!(stored_hash(&state, "officer").await, hash);

    login(&server, "officer", "Secret123").await.assert_status_ok();
}

#[tokio::test]
async fn test_maintenance_disabled_without_key() {
    let (server, state) = setup_with(AuthConfig {
        service_role_key: String::new(),
        legacy_password_migration: true,
    })
    .await;
    db::admins::insert(&state.pool, "officer", "plain", None)
        .await
        .unwrap();
    let hash = bcrypt::hash("Secret123", 4).unwrap();

    let response = server
        .put("/api/admin/maintenance/password")
        .add_header(service_key_header(), HeaderValue::from_static(""))
        .json(&json!({ "username": "officer", "password_hash": hash }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stored_hash(&state, "officer").await, "plain");
}
