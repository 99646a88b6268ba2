use super::{
    models::{
        CompetitionLevel, Game, GameCategory, Gender, SchoolLevel, DEFAULT_MAX_QUALIFIERS,
    },
    DbPool,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewGame {
    pub name: String,
    pub category: GameCategory,
    pub level: CompetitionLevel,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub school_level: SchoolLevel,
    pub description: Option<String>,
    #[serde(default)]
    pub is_timed: bool,
    pub max_qualifiers: Option<i64>,
    pub race_type: Option<String>,
    pub championship_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameUpdate {
    pub name: Option<String>,
    pub category: Option<GameCategory>,
    pub level: Option<CompetitionLevel>,
    pub gender: Option<Gender>,
    pub school_level: Option<SchoolLevel>,
    pub description: Option<String>,
    pub is_timed: Option<bool>,
    pub max_qualifiers: Option<i64>,
    pub race_type: Option<String>,
    pub championship_id: Option<String>,
}

/// Games ordered by name, optionally limited to one category.
pub async fn list(pool: &DbPool, category: Option<GameCategory>) -> Result<Vec<Game>, sqlx::Error> {
    match category {
        Some(category) => {
            sqlx::query_as("SELECT * FROM games WHERE category = ? ORDER BY name")
                .bind(category)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as("SELECT * FROM games ORDER BY name")
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn get(pool: &DbPool, id: &str) -> Result<Game, sqlx::Error> {
    sqlx::query_as("SELECT * FROM games WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &DbPool, new: NewGame) -> Result<Game, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let game = Game {
        id: Uuid::new_v4().to_string(),
        name: new.name,
        category: new.category,
        level: new.level,
        gender: new.gender,
        school_level: new.school_level,
        description: new.description.filter(|d| !d.trim().is_empty()),
        is_timed: new.is_timed,
        max_qualifiers: new
            .max_qualifiers
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_MAX_QUALIFIERS),
        race_type: new.race_type.filter(|r| !r.trim().is_empty()),
        championship_id: new.championship_id.filter(|c| !c.trim().is_empty()),
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO games (id, name, category, level, gender, school_level, description, is_timed, max_qualifiers, race_type, championship_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&game.id)
    .bind(&game.name)
    .bind(game.category)
    .bind(game.level)
    .bind(game.gender)
    .bind(game.school_level)
    .bind(&game.description)
    .bind(game.is_timed)
    .bind(game.max_qualifiers)
    .bind(&game.race_type)
    .bind(&game.championship_id)
    .bind(&game.created_at)
    .bind(&game.updated_at)
    .execute(pool)
    .await?;

    Ok(game)
}

pub async fn update(pool: &DbPool, id: &str, changes: GameUpdate) -> Result<Game, sqlx::Error> {
    let mut game = get(pool, id).await?;

    if let Some(name) = changes.name {
        game.name = name;
    }
    if let Some(category) = changes.category {
        game.category = category;
    }
    if let Some(level) = changes.level {
        game.level = level;
    }
    if let Some(gender) = changes.gender {
        game.gender = gender;
    }
    if let Some(school_level) = changes.school_level {
        game.school_level = school_level;
    }
    if let Some(description) = changes.description {
        game.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(is_timed) = changes.is_timed {
        game.is_timed = is_timed;
    }
    if let Some(max_qualifiers) = changes.max_qualifiers.filter(|m| *m > 0) {
        game.max_qualifiers = max_qualifiers;
    }
    if let Some(race_type) = changes.race_type {
        game.race_type = Some(race_type).filter(|r| !r.trim().is_empty());
    }
    if let Some(championship_id) = changes.championship_id {
        game.championship_id = Some(championship_id).filter(|c| !c.trim().is_empty());
    }
    game.updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE games SET name = ?, category = ?, level = ?, gender = ?, school_level = ?, description = ?,
         is_timed = ?, max_qualifiers = ?, race_type = ?, championship_id = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&game.name)
    .bind(game.category)
    .bind(game.level)
    .bind(game.gender)
    .bind(game.school_level)
    .bind(&game.description)
    .bind(game.is_timed)
    .bind(game.max_qualifiers)
    .bind(&game.race_type)
    .bind(&game.championship_id)
    .bind(&game.updated_at)
    .bind(&game.id)
    .execute(pool)
    .await?;

    Ok(game)
}

pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM games WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
