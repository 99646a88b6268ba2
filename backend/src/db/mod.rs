pub mod admins;
pub mod championships;
pub mod circulars;
pub mod games;
pub mod heats;
pub mod match_pools;
pub mod models;
pub mod participants;
pub mod schools;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;

pub type DbPool = Pool<Sqlite>;

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    // Create the database file if it doesn't exist
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new().connect_with(options).await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    let migration_sql = include_str!("migrations/001_initial_schema.sql");

    sqlx::query(migration_sql).execute(pool).await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
