use super::{
    models::{Heat, HeatParticipant, HeatParticipantDetail, HeatType, ParticipantDetail},
    DbPool,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewHeat {
    pub game_id: String,
    pub heat_number: i64,
    #[serde(default)]
    pub heat_type: HeatType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHeatParticipant {
    pub participant_id: String,
    pub time_taken: Option<f64>,
    pub position: Option<i64>,
    #[serde(default)]
    pub is_qualified_for_final: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeatParticipantUpdate {
    pub time_taken: Option<f64>,
    pub position: Option<i64>,
    pub is_qualified_for_final: Option<bool>,
}

/// Heats of a game grouped by type (`final` sorts before `heat`), then by number.
pub async fn list_for_game(pool: &DbPool, game_id: &str) -> Result<Vec<Heat>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM heats WHERE game_id = ? ORDER BY heat_type ASC, heat_number ASC",
    )
    .bind(game_id)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &DbPool, id: &str) -> Result<Heat, sqlx::Error> {
    sqlx::query_as("SELECT * FROM heats WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &DbPool, new: NewHeat) -> Result<Heat, sqlx::Error> {
    let heat = Heat {
        id: Uuid::new_v4().to_string(),
        game_id: new.game_id,
        heat_number: new.heat_number,
        heat_type: new.heat_type,
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        "INSERT INTO heats (id, game_id, heat_number, heat_type, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&heat.id)
    .bind(&heat.game_id)
    .bind(heat.heat_number)
    .bind(heat.heat_type)
    .bind(&heat.created_at)
    .execute(pool)
    .await?;

    Ok(heat)
}

/// Deleting a heat removes its entries through the foreign key cascade.
pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM heats WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

const ENTRY_ORDER: &str = "ORDER BY position IS NULL, position ASC, created_at ASC";

pub async fn list_entries(pool: &DbPool, heat_id: &str) -> Result<Vec<HeatParticipant>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM heat_participants WHERE heat_id = ? {}",
        ENTRY_ORDER
    );
    sqlx::query_as(&sql).bind(heat_id).fetch_all(pool).await
}

/// Entries of every heat belonging to a game.
pub async fn list_entries_for_game(
    pool: &DbPool,
    game_id: &str,
) -> Result<Vec<HeatParticipant>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM heat_participants WHERE heat_id IN (SELECT id FROM heats WHERE game_id = ?) {}",
        ENTRY_ORDER
    );
    sqlx::query_as(&sql).bind(game_id).fetch_all(pool).await
}

pub fn attach_relations(
    entries: Vec<HeatParticipant>,
    participants: &[ParticipantDetail],
    heats: &[Heat],
) -> Vec<HeatParticipantDetail> {
    let participants: HashMap<&str, &ParticipantDetail> = participants
        .iter()
        .map(|p| (p.participant.id.as_str(), p))
        .collect();
    let heats: HashMap<&str, &Heat> = heats.iter().map(|h| (h.id.as_str(), h)).collect();

    entries
        .into_iter()
        .map(|entry| HeatParticipantDetail {
            participant: participants
                .get(entry.participant_id.as_str())
                .map(|p| (*p).clone()),
            heat: heats.get(entry.heat_id.as_str()).map(|h| (*h).clone()),
            entry,
        })
        .collect()
}

pub async fn get_entry(pool: &DbPool, id: &str) -> Result<HeatParticipant, sqlx::Error> {
    sqlx::query_as("SELECT * FROM heat_participants WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert_entry(
    pool: &DbPool,
    heat_id: &str,
    new: NewHeatParticipant,
) -> Result<HeatParticipant, sqlx::Error> {
    let entry = HeatParticipant {
        id: Uuid::new_v4().to_string(),
        heat_id: heat_id.to_string(),
        participant_id: new.participant_id,
        time_taken: new.time_taken,
        position: new.position,
        is_qualified_for_final: new.is_qualified_for_final,
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        "INSERT INTO heat_participants (id, heat_id, participant_id, time_taken, position, is_qualified_for_final, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.id)
    .bind(&entry.heat_id)
    .bind(&entry.participant_id)
    .bind(entry.time_taken)
    .bind(entry.position)
    .bind(entry.is_qualified_for_final)
    .bind(&entry.created_at)
    .execute(pool)
    .await?;

    Ok(entry)
}

pub async fn update_entry(
    pool: &DbPool,
    id: &str,
    changes: HeatParticipantUpdate,
) -> Result<HeatParticipant, sqlx::Error> {
    let mut entry = get_entry(pool, id).await?;

    if changes.time_taken.is_some() {
        entry.time_taken = changes.time_taken;
    }
    if changes.position.is_some() {
        entry.position = changes.position;
    }
    if let Some(q) = changes.is_qualified_for_final {
        entry.is_qualified_for_final = q;
    }

    sqlx::query(
        "UPDATE heat_participants SET time_taken = ?, position = ?, is_qualified_for_final = ? WHERE id = ?",
    )
    .bind(entry.time_taken)
    .bind(entry.position)
    .bind(entry.is_qualified_for_final)
    .bind(&entry.id)
    .execute(pool)
    .await?;

    Ok(entry)
}

pub async fn delete_entry(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM heat_participants WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
