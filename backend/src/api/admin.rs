use super::{auth::AdminResponse, AppState};
use crate::{
    audit,
    auth::is_bcrypt_hash,
    db::{
        self,
        models::{CompetitionLevel, Game, Participant},
    },
    error::{AppError, Result},
};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const SERVICE_KEY_HEADER: &str = "x-service-key";

#[derive(Debug, Serialize)]
pub struct GameQualifierStatus {
    pub game_id: String,
    pub name: String,
    pub level: CompetitionLevel,
    pub participants: usize,
    pub qualified: usize,
    pub max_qualifiers: i64,
    pub exceeds_max_qualifiers: bool,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub games: usize,
    pub participants: usize,
    pub schools: usize,
    pub qualified: usize,
    pub championships: usize,
    pub circulars: usize,
    pub admins: i64,
    pub qualifier_status: Vec<GameQualifierStatus>,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordHashRequest {
    pub username: String,
    pub password_hash: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/overview", get(overview))
        .route("/maintenance/password", put(set_password_hash))
}

/// Per game: how many entrants it has and how many are flagged to advance.
pub fn qualifier_status(games: &[Game], participants: &[Participant]) -> Vec<GameQualifierStatus> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for p in participants {
        let entry = counts.entry(p.game_id.as_str()).or_default();
        entry.0 += 1;
        if p.is_qualified {
            entry.1 += 1;
        }
    }

    games
        .iter()
        .map(|game| {
            let (entrants, qualified) = counts.get(game.id.as_str()).copied().unwrap_or_default();
            GameQualifierStatus {
                game_id: game.id.clone(),
                name: game.name.clone(),
                level: game.level,
                participants: entrants,
                qualified,
                max_qualifiers: game.max_qualifiers,
                exceeds_max_qualifiers: qualified as i64 > game.max_qualifiers,
            }
        })
        .collect()
}

async fn overview(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<Overview>> {
    state.require_admin(&headers).await?;

    let games = db::games::list(&state.pool, None).await?;
    let participants = db::participants::list(&state.pool, None).await?;
    let schools = db::schools::list(&state.pool).await?;
    let championships = db::championships::list(&state.pool).await?;
    let circulars = db::circulars::list(&state.pool, None).await?;
    let admins = db::admins::count(&state.pool).await?;

    Ok(Json(Overview {
        games: games.len(),
        participants: participants.len(),
        schools: schools.len(),
        qualified: participants.iter().filter(|p| p.is_qualified).count(),
        championships: championships.len(),
        circulars: circulars.len(),
        admins,
        qualifier_status: qualifier_status(&games, &participants),
    }))
}

/// Compare without stopping at the first differing byte.
fn keys_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Store a pre-computed bcrypt hash for an admin. Used by the
/// `hash-admin-password` tool; authenticated with the service key rather than
/// an admin session.
async fn set_password_hash(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SetPasswordHashRequest>,
) -> Result<Json<AdminResponse>> {
    if !state.auth_config.maintenance_enabled() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "SERVICE_ROLE_KEY is not configured on the server"
        )));
    }

    let given = headers
        .get(SERVICE_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if !keys_match(given, &state.auth_config.service_role_key) {
        audit::log_security_event(&req.username, "bad_service_key", "maintenance password update");
        return Err(AppError::Unauthorized);
    }

    if req.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if !is_bcrypt_hash(&req.password_hash) {
        return Err(AppError::Validation(
            "password_hash must be a bcrypt hash".to_string(),
        ));
    }

    let admin = db::admins::update_password_hash_by_username(
        &state.pool,
        req.username.trim(),
        &req.password_hash,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Admin '{}' not found", req.username.trim())))?;

    audit::log_admin_action("maintenance", "set_password_hash", "admin", &admin.id);

    Ok(Json(admin.into()))
}
