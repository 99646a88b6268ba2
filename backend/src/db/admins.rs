use super::{models::Admin, DbPool};

pub async fn find_by_username(pool: &DbPool, username: &str) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM admins WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn get(pool: &DbPool, id: &str) -> Result<Admin, sqlx::Error> {
    sqlx::query_as("SELECT * FROM admins WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// `password_hash` is stored as given; legacy rows may hold plain text.
pub async fn insert(
    pool: &DbPool,
    username: &str,
    password_hash: &str,
    email: Option<String>,
) -> Result<Admin, sqlx::Error> {
    let admin = Admin::new(username.to_string(), password_hash.to_string(), email);

    sqlx::query(
        "INSERT INTO admins (id, username, password_hash, email, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&admin.id)
    .bind(&admin.username)
    .bind(&admin.password_hash)
    .bind(&admin.email)
    .bind(&admin.created_at)
    .execute(pool)
    .await?;

    Ok(admin)
}

pub async fn update_password_hash(
    pool: &DbPool,
    id: &str,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admins SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns the updated admin, or `None` when the username is unknown.
pub async fn update_password_hash_by_username(
    pool: &DbPool,
    username: &str,
    password_hash: &str,
) -> Result<Option<Admin>, sqlx::Error> {
    let result = sqlx::query("UPDATE admins SET password_hash = ? WHERE username = ?")
        .bind(password_hash)
        .bind(username)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_username(pool, username).await
}

pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await
}
