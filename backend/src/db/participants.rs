//! Participant persistence, including the two bulk workflows (qualifier
//! selection and time ranking). Both run inside a single transaction.

use super::{
    models::{Game, Gender, Participant, ParticipantDetail, School},
    DbPool,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewParticipant {
    pub first_name: String,
    pub last_name: String,
    pub school_id: String,
    pub game_id: String,
    #[serde(default)]
    pub gender: Gender,
    pub time_taken: Option<f64>,
    pub position: Option<i64>,
    pub score: Option<f64>,
    #[serde(default)]
    pub is_qualified: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipantUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub school_id: Option<String>,
    pub game_id: Option<String>,
    pub gender: Option<Gender>,
    pub time_taken: Option<f64>,
    pub position: Option<i64>,
    pub score: Option<f64>,
    pub is_qualified: Option<bool>,
    pub notes: Option<String>,
}

/// Outcome of a bulk qualify run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QualifyOutcome {
    pub game_id: String,
    pub qualified_ids: Vec<String>,
    /// Requested ids that do not belong to the game and were skipped.
    pub ignored_ids: Vec<String>,
    pub max_qualifiers: i64,
    pub exceeds_max_qualifiers: bool,
}

const ORDER_BY_POSITION: &str = "ORDER BY position IS NULL, position ASC, created_at ASC";

/// All participants (or one game's), ordered by position with unplaced rows last.
pub async fn list(pool: &DbPool, game_id: Option<&str>) -> Result<Vec<Participant>, sqlx::Error> {
    match game_id {
        Some(game_id) => {
            let sql = format!(
                "SELECT * FROM participants WHERE game_id = ? {}",
                ORDER_BY_POSITION
            );
            sqlx::query_as(&sql).bind(game_id).fetch_all(pool).await
        }
        None => {
            let sql = format!("SELECT * FROM participants {}", ORDER_BY_POSITION);
            sqlx::query_as(&sql).fetch_all(pool).await
        }
    }
}

/// Same as [`list`] with each row's school and game attached.
pub async fn list_detailed(
    pool: &DbPool,
    game_id: Option<&str>,
) -> Result<Vec<ParticipantDetail>, sqlx::Error> {
    let participants = list(pool, game_id).await?;
    let schools = super::schools::list(pool).await?;
    let games = super::games::list(pool, None).await?;
    Ok(attach_relations(participants, &schools, &games))
}

pub fn attach_relations(
    participants: Vec<Participant>,
    schools: &[School],
    games: &[Game],
) -> Vec<ParticipantDetail> {
    let schools: HashMap<&str, &School> = schools.iter().map(|s| (s.id.as_str(), s)).collect();
    let games: HashMap<&str, &Game> = games.iter().map(|g| (g.id.as_str(), g)).collect();

    participants
        .into_iter()
        .map(|participant| ParticipantDetail {
            school: schools.get(participant.school_id.as_str()).map(|s| (*s).clone()),
            game: games.get(participant.game_id.as_str()).map(|g| (*g).clone()),
            participant,
        })
        .collect()
}

pub async fn get(pool: &DbPool, id: &str) -> Result<Participant, sqlx::Error> {
    sqlx::query_as("SELECT * FROM participants WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &DbPool, new: NewParticipant) -> Result<Participant, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let participant = Participant {
        id: Uuid::new_v4().to_string(),
        first_name: new.first_name,
        last_name: new.last_name,
        school_id: new.school_id,
        game_id: new.game_id,
        gender: new.gender,
        time_taken: new.time_taken,
        position: new.position,
        score: new.score,
        is_qualified: new.is_qualified,
        notes: new.notes.filter(|n| !n.trim().is_empty()),
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO participants (id, first_name, last_name, school_id, game_id, gender, time_taken, position, score, is_qualified, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&participant.id)
    .bind(&participant.first_name)
    .bind(&participant.last_name)
    .bind(&participant.school_id)
    .bind(&participant.game_id)
    .bind(participant.gender)
    .bind(participant.time_taken)
    .bind(participant.position)
    .bind(participant.score)
    .bind(participant.is_qualified)
    .bind(&participant.notes)
    .bind(&participant.created_at)
    .bind(&participant.updated_at)
    .execute(pool)
    .await?;

    Ok(participant)
}

pub async fn update(
    pool: &DbPool,
    id: &str,
    changes: ParticipantUpdate,
) -> Result<Participant, sqlx::Error> {
    let mut p = get(pool, id).await?;

    if let Some(first_name) = changes.first_name {
        p.first_name = first_name;
    }
    if let Some(last_name) = changes.last_name {
        p.last_name = last_name;
    }
    if let Some(school_id) = changes.school_id {
        p.school_id = school_id;
    }
    if let Some(game_id) = changes.game_id {
        p.game_id = game_id;
    }
    if let Some(gender) = changes.gender {
        p.gender = gender;
    }
    if changes.time_taken.is_some() {
        p.time_taken = changes.time_taken;
    }
    if changes.position.is_some() {
        p.position = changes.position;
    }
    if changes.score.is_some() {
        p.score = changes.score;
    }
    if let Some(is_qualified) = changes.is_qualified {
        p.is_qualified = is_qualified;
    }
    if let Some(notes) = changes.notes {
        p.notes = Some(notes).filter(|n| !n.trim().is_empty());
    }
    p.updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE participants SET first_name = ?, last_name = ?, school_id = ?, game_id = ?, gender = ?,
         time_taken = ?, position = ?, score = ?, is_qualified = ?, notes = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&p.first_name)
    .bind(&p.last_name)
    .bind(&p.school_id)
    .bind(&p.game_id)
    .bind(p.gender)
    .bind(p.time_taken)
    .bind(p.position)
    .bind(p.score)
    .bind(p.is_qualified)
    .bind(&p.notes)
    .bind(&p.updated_at)
    .bind(&p.id)
    .execute(pool)
    .await?;

    Ok(p)
}

pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM participants WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Participants of a game that have a recorded time, fastest first. Rows with
/// equal times keep insertion order.
pub async fn list_timed(pool: &DbPool, game_id: &str) -> Result<Vec<Participant>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM participants WHERE game_id = ? AND time_taken IS NOT NULL
         ORDER BY time_taken ASC, created_at ASC, rowid ASC",
    )
    .bind(game_id)
    .fetch_all(pool)
    .await
}

/// Make `qualified_ids` the exact qualifier set of `game`.
pub async fn set_qualifiers(
    pool: &DbPool,
    game: &Game,
    qualified_ids: &[String],
) -> Result<QualifyOutcome, sqlx::Error> {
    let game_participants: HashSet<String> =
        sqlx::query_scalar("SELECT id FROM participants WHERE game_id = ?")
            .bind(&game.id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let mut seen = HashSet::new();
    let (accepted, ignored): (Vec<String>, Vec<String>) = qualified_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .partition(|id| game_participants.contains(id));

    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE participants SET is_qualified = 0, updated_at = ? WHERE game_id = ?")
        .bind(&now)
        .bind(&game.id)
        .execute(&mut *tx)
        .await?;

    for id in &accepted {
        sqlx::query(
            "UPDATE participants SET is_qualified = 1, updated_at = ? WHERE id = ? AND game_id = ?",
        )
        .bind(&now)
        .bind(id)
        .bind(&game.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(QualifyOutcome {
        game_id: game.id.clone(),
        exceeds_max_qualifiers: accepted.len() as i64 > game.max_qualifiers,
        qualified_ids: accepted,
        ignored_ids: ignored,
        max_qualifiers: game.max_qualifiers,
    })
}

/// Write computed positions for one game in a single transaction.
pub async fn apply_positions(
    pool: &DbPool,
    game_id: &str,
    positions: &[(String, i64)],
) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    for (id, position) in positions {
        sqlx::query("UPDATE participants SET position = ?, updated_at = ? WHERE id = ? AND game_id = ?")
            .bind(position)
            .bind(&now)
            .bind(id)
            .bind(game_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}
