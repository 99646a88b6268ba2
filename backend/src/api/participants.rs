use super::{deleted, require_text, AppState};
use crate::{
    audit,
    cache::{self, keys},
    db::{
        self,
        models::Participant,
        participants::{NewParticipant, ParticipantUpdate},
    },
    error::{AppError, Result},
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const AFFECTED: [&str; 5] = [
    keys::PARTICIPANTS,
    keys::HEAT_PARTICIPANTS,
    keys::RANKINGS,
    keys::QUALIFIED,
    keys::STATS,
];

#[derive(Debug, Deserialize)]
pub struct ParticipantListQuery {
    pub game_id: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_participants).post(create_participant))
        .route("/:id", put(update_participant).delete(delete_participant))
}

/// Reject references to schools or games that do not exist with a 400
/// instead of a constraint failure.
async fn check_references(
    state: &AppState,
    school_id: Option<&str>,
    game_id: Option<&str>,
) -> Result<()> {
    let unknown = |what: &'static str| {
        move |e: sqlx::Error| match e {
            sqlx::Error::RowNotFound => AppError::Validation(format!("Unknown {}", what)),
            other => other.into(),
        }
    };

    if let Some(school_id) = school_id {
        db::schools::get(&state.pool, school_id)
            .await
            .map_err(unknown("school"))?;
    }
    if let Some(game_id) = game_id {
        db::games::get(&state.pool, game_id)
            .await
            .map_err(unknown("game"))?;
    }
    Ok(())
}

async fn list_participants(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<Json<Value>> {
    let game_id = query.game_id.filter(|g| !g.is_empty());
    let key = cache::key(keys::PARTICIPANTS, &[("game", game_id.as_deref())]);

    let participants = state
        .cache
        .get_or_load(key, || async {
            Ok(db::participants::list_detailed(&state.pool, game_id.as_deref()).await?)
        })
        .await?;
    Ok(Json(participants))
}

async fn create_participant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewParticipant>,
) -> Result<Json<Participant>> {
    let session = state.require_admin(&headers).await?;
    require_text(&req.first_name, "First name")?;
    require_text(&req.last_name, "Last name")?;
    check_references(&state, Some(&req.school_id), Some(&req.game_id)).await?;

    let participant = db::participants::insert(&state.pool, req).await?;
    state.cache.invalidate(&AFFECTED).await;
    audit::log_admin_action(&session.username, "create", "participant", &participant.id);

    Ok(Json(participant))
}

async fn update_participant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ParticipantUpdate>,
) -> Result<Json<Participant>> {
    let session = state.require_admin(&headers).await?;
    if let Some(first_name) = &req.first_name {
        require_text(first_name, "First name")?;
    }
    if let Some(last_name) = &req.last_name {
        require_text(last_name, "Last name")?;
    }
    check_references(&state, req.school_id.as_deref(), req.game_id.as_deref()).await?;

    let participant = db::participants::update(&state.pool, &id, req).await?;
    state.cache.invalidate(&AFFECTED).await;
    audit::log_admin_action(&session.username, "update", "participant", &id);

    Ok(Json(participant))
}

async fn delete_participant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let session = state.require_admin(&headers).await?;

    deleted(db::participants::delete(&state.pool, &id).await?, "Participant")?;
    state.cache.invalidate(&AFFECTED).await;
    audit::log_admin_action(&session.username, "delete", "participant", &id);

    Ok(Json(serde_json::json!({ "success": true })))
}
