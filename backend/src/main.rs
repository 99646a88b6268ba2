use std::time::Duration;
use tracing_subscriber::EnvFilter;
use zaroda_server::{build_state, config, create_app, db, ensure_bootstrap_admin};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load config
    let config = config::Config::from_env()?;
    tracing::info!("Starting zaroda server on {}", config.server_addr());

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    // Run migrations
    db::run_migrations(&pool).await?;

    if let Some(admin) = &config.bootstrap_admin {
        ensure_bootstrap_admin(&pool, admin).await?;
    }

    let state = build_state(
        pool,
        config.jwt_secret.clone(),
        config.session_hours,
        Duration::from_secs(config.cache_ttl_secs),
        config.auth.clone(),
    );
    let app = create_app(state, &config.cors_allowed_origins);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("Server listening on {}", config.server_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
