use super::{
    models::{MatchPool, MatchPoolDetail, School, DEFAULT_ROUND_NAME},
    DbPool,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewMatchPool {
    pub game_id: String,
    pub round_name: Option<String>,
    pub team_a_school_id: Option<String>,
    pub team_b_school_id: Option<String>,
    pub team_a_score: Option<i64>,
    pub team_b_score: Option<i64>,
    pub winner_school_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchPoolUpdate {
    pub round_name: Option<String>,
    pub team_a_school_id: Option<String>,
    pub team_b_school_id: Option<String>,
    pub team_a_score: Option<i64>,
    pub team_b_score: Option<i64>,
    pub winner_school_id: Option<String>,
    pub notes: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn list(pool: &DbPool, game_id: Option<&str>) -> Result<Vec<MatchPool>, sqlx::Error> {
    match game_id {
        Some(game_id) => {
            sqlx::query_as("SELECT * FROM match_pools WHERE game_id = ? ORDER BY round_name ASC, created_at ASC")
                .bind(game_id)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as("SELECT * FROM match_pools ORDER BY round_name ASC, created_at ASC")
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn list_detailed(
    pool: &DbPool,
    game_id: Option<&str>,
) -> Result<Vec<MatchPoolDetail>, sqlx::Error> {
    let pools = list(pool, game_id).await?;
    let schools = super::schools::list(pool).await?;
    let by_id: HashMap<&str, &School> = schools.iter().map(|s| (s.id.as_str(), s)).collect();
    let lookup = |id: &Option<String>| {
        id.as_deref()
            .and_then(|id| by_id.get(id))
            .map(|s| (*s).clone())
    };

    Ok(pools
        .into_iter()
        .map(|m| MatchPoolDetail {
            team_a_school: lookup(&m.team_a_school_id),
            team_b_school: lookup(&m.team_b_school_id),
            winner_school: lookup(&m.winner_school_id),
            pool: m,
        })
        .collect())
}

pub async fn get(pool: &DbPool, id: &str) -> Result<MatchPool, sqlx::Error> {
    sqlx::query_as("SELECT * FROM match_pools WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &DbPool, new: NewMatchPool) -> Result<MatchPool, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let pool_row = MatchPool {
        id: Uuid::new_v4().to_string(),
        game_id: new.game_id,
        round_name: non_blank(new.round_name).unwrap_or_else(|| DEFAULT_ROUND_NAME.to_string()),
        team_a_school_id: non_blank(new.team_a_school_id),
        team_b_school_id: non_blank(new.team_b_school_id),
        team_a_score: new.team_a_score,
        team_b_score: new.team_b_score,
        winner_school_id: non_blank(new.winner_school_id),
        notes: non_blank(new.notes),
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO match_pools (id, game_id, round_name, team_a_school_id, team_b_school_id, team_a_score, team_b_score, winner_school_id, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&pool_row.id)
    .bind(&pool_row.game_id)
    .bind(&pool_row.round_name)
    .bind(&pool_row.team_a_school_id)
    .bind(&pool_row.team_b_school_id)
    .bind(pool_row.team_a_score)
    .bind(pool_row.team_b_score)
    .bind(&pool_row.winner_school_id)
    .bind(&pool_row.notes)
    .bind(&pool_row.created_at)
    .bind(&pool_row.updated_at)
    .execute(pool)
    .await?;

    Ok(pool_row)
}

pub async fn update(
    pool: &DbPool,
    id: &str,
    changes: MatchPoolUpdate,
) -> Result<MatchPool, sqlx::Error> {
    let mut m = get(pool, id).await?;

    if let Some(round_name) = non_blank(changes.round_name) {
        m.round_name = round_name;
    }
    if let Some(team_a) = changes.team_a_school_id {
        m.team_a_school_id = non_blank(Some(team_a));
    }
    if let Some(team_b) = changes.team_b_school_id {
        m.team_b_school_id = non_blank(Some(team_b));
    }
    if changes.team_a_score.is_some() {
        m.team_a_score = changes.team_a_score;
    }
    if changes.team_b_score.is_some() {
        m.team_b_score = changes.team_b_score;
    }
    if let Some(winner) = changes.winner_school_id {
        m.winner_school_id = non_blank(Some(winner));
    }
    if let Some(notes) = changes.notes {
        m.notes = non_blank(Some(notes));
    }
    m.updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE match_pools SET round_name = ?, team_a_school_id = ?, team_b_school_id = ?, team_a_score = ?,
         team_b_score = ?, winner_school_id = ?, notes = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&m.round_name)
    .bind(&m.team_a_school_id)
    .bind(&m.team_b_school_id)
    .bind(m.team_a_score)
    .bind(m.team_b_score)
    .bind(&m.winner_school_id)
    .bind(&m.notes)
    .bind(&m.updated_at)
    .bind(&m.id)
    .execute(pool)
    .await?;

    Ok(m)
}

pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM match_pools WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
