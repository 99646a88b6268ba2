use super::{
    models::{Circular, CompetitionLevel, DEFAULT_SENDER_ROLE},
    DbPool,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCircular {
    pub title: String,
    pub content: String,
    pub sender_name: String,
    pub sender_role: Option<String>,
    pub target_level: Option<CompetitionLevel>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CircularUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub sender_name: Option<String>,
    pub sender_role: Option<String>,
    pub target_level: Option<CompetitionLevel>,
    pub is_published: Option<bool>,
}

/// Newest first, optionally only those addressed to one level.
pub async fn list(
    pool: &DbPool,
    level: Option<CompetitionLevel>,
) -> Result<Vec<Circular>, sqlx::Error> {
    match level {
        Some(level) => {
            sqlx::query_as("SELECT * FROM circulars WHERE target_level = ? ORDER BY created_at DESC")
                .bind(level)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as("SELECT * FROM circulars ORDER BY created_at DESC")
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn get(pool: &DbPool, id: &str) -> Result<Circular, sqlx::Error> {
    sqlx::query_as("SELECT * FROM circulars WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &DbPool, new: NewCircular) -> Result<Circular, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let circular = Circular {
        id: Uuid::new_v4().to_string(),
        title: new.title,
        content: new.content,
        sender_name: new.sender_name,
        sender_role: new
            .sender_role
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER_ROLE.to_string()),
        target_level: new.target_level.unwrap_or(CompetitionLevel::Zone),
        is_published: new.is_published,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO circulars (id, title, content, sender_name, sender_role, target_level, is_published, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&circular.id)
    .bind(&circular.title)
    .bind(&circular.content)
    .bind(&circular.sender_name)
    .bind(&circular.sender_role)
    .bind(circular.target_level)
    .bind(circular.is_published)
    .bind(&circular.created_at)
    .bind(&circular.updated_at)
    .execute(pool)
    .await?;

    Ok(circular)
}

pub async fn update(
    pool: &DbPool,
    id: &str,
    changes: CircularUpdate,
) -> Result<Circular, sqlx::Error> {
    let mut c = get(pool, id).await?;

    if let Some(title) = changes.title {
        c.title = title;
    }
    if let Some(content) = changes.content {
        c.content = content;
    }
    if let Some(sender_name) = changes.sender_name {
        c.sender_name = sender_name;
    }
    if let Some(sender_role) = changes.sender_role.filter(|r| !r.trim().is_empty()) {
        c.sender_role = sender_role;
    }
    if let Some(level) = changes.target_level {
        c.target_level = level;
    }
    if let Some(published) = changes.is_published {
        c.is_published = published;
    }
    c.updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE circulars SET title = ?, content = ?, sender_name = ?, sender_role = ?, target_level = ?, is_published = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&c.title)
    .bind(&c.content)
    .bind(&c.sender_name)
    .bind(&c.sender_role)
    .bind(c.target_level)
    .bind(c.is_published)
    .bind(&c.updated_at)
    .bind(&c.id)
    .execute(pool)
    .await?;

    Ok(c)
}

pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM circulars WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
