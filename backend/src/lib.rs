//! Zaroda Server Library
//!
//! School sports competitions from zone to national level: schools, games,
//! participants, heats, match pools, results and qualification. This module
//! exposes the server components for integration testing.

pub mod api;
pub mod audit;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod ranking;

use axum::{http::HeaderValue, routing::get, Router};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Creates the application router with all endpoints
pub fn create_app(state: Arc<api::AppState>, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let cors = if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    };

    Router::new()
        .route("/", get(|| async { "Zaroda Sports Server" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api/auth", api::auth_router())
        .nest("/api/schools", api::schools_router())
        .nest("/api/games", api::games_router())
        .nest("/api/participants", api::participants_router())
        .nest("/api/heats", api::heats_router())
        .nest("/api/match-pools", api::match_pools_router())
        .nest("/api/championships", api::championships_router())
        .nest("/api/circulars", api::circulars_router())
        .nest("/api/admin", api::admin_router())
        .nest("/api", api::results_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Build the shared state from its parts.
pub fn build_state(
    pool: db::DbPool,
    jwt_secret: String,
    session_hours: i64,
    cache_ttl: Duration,
    auth_config: config::AuthConfig,
) -> Arc<api::AppState> {
    Arc::new(api::AppState {
        pool,
        jwt_manager: Arc::new(auth::JwtManager::new(jwt_secret, session_hours)),
        revocations: auth::RevocationList::new(),
        login_throttle: auth::LoginThrottle::default(),
        cache: cache::QueryCache::new(cache_ttl),
        auth_config,
    })
}

/// Create the configured admin unless an admin with that username exists.
pub async fn ensure_bootstrap_admin(
    pool: &db::DbPool,
    admin: &config::BootstrapAdmin,
) -> anyhow::Result<()> {
    if db::admins::find_by_username(pool, &admin.username)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let hash = auth::hash_password(&admin.password)
        .map_err(|e| anyhow::anyhow!("Failed to hash bootstrap password: {}", e))?;
    let created = db::admins::insert(pool, &admin.username, &hash, None).await?;
    tracing::info!("Created bootstrap admin '{}'", created.username);
    Ok(())
}

pub const TEST_SERVICE_KEY: &str = "test_service_key";

/// Test helper to create an in-memory database and run migrations
pub async fn create_test_db() -> db::DbPool {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    // Every connection to :memory: is its own database, so keep exactly one.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid in-memory database URL")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Test helper to create a fully configured test app
pub async fn create_test_app() -> (Router, Arc<api::AppState>) {
    create_test_app_with(config::AuthConfig {
        service_role_key: TEST_SERVICE_KEY.to_string(),
        legacy_password_migration: true,
    })
    .await
}

pub async fn create_test_app_with(auth_config: config::AuthConfig) -> (Router, Arc<api::AppState>) {
    let pool = create_test_db().await;
    let state = build_state(
        pool,
        "test_secret_key".to_string(),
        12,
        Duration::from_secs(30),
        auth_config,
    );
    let app = create_app(state.clone(), &[]);
    (app, state)
}
