use super::{deleted, AppState};
use crate::{
    audit,
    cache::{self, keys},
    db::{
        self,
        heats::{HeatParticipantUpdate, NewHeat, NewHeatParticipant},
        models::{Heat, HeatParticipant},
    },
    error::{AppError, Result},
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_heat))
        .route("/:id", delete(delete_heat))
        .route("/:id/participants", get(list_entries).post(add_entry))
        .route("/participants/:id", put(update_entry).delete(delete_entry))
}

fn not_found(entity: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound(format!("{} not found", entity)),
        other => other.into(),
    }
}

async fn create_heat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewHeat>,
) -> Result<Json<Heat>> {
    let session = state.require_admin(&headers).await?;
    if req.heat_number < 1 {
        return Err(AppError::Validation(
            "Heat number must be at least 1".to_string(),
        ));
    }
    db::games::get(&state.pool, &req.game_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::Validation("Unknown game".to_string()),
            other => other.into(),
        })?;

    let heat = db::heats::insert(&state.pool, req).await?;
    state.cache.invalidate(&[keys::HEATS]).await;
    audit::log_admin_action(&session.username, "create", "heat", &heat.id);

    Ok(Json(heat))
}

async fn delete_heat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let session = state.require_admin(&headers).await?;

    deleted(db::heats::delete(&state.pool, &id).await?, "Heat")?;
    state
        .cache
        .invalidate(&[keys::HEATS, keys::HEAT_PARTICIPANTS])
        .await;
    audit::log_admin_action(&session.username, "delete", "heat", &id);

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Entries of one heat, each with its participant (and that participant's
/// school and game) attached.
async fn list_entries(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let key = cache::key(keys::HEAT_PARTICIPANTS, &[("heat", Some(id.as_str()))]);
    let entries = state
        .cache
        .get_or_load(key, || async {
            let heat = db::heats::get(&state.pool, &id)
                .await
                .map_err(not_found("Heat"))?;
            let entries = db::heats::list_entries(&state.pool, &heat.id).await?;
            let participants =
                db::participants::list_detailed(&state.pool, Some(&heat.game_id)).await?;
            Ok(db::heats::attach_relations(entries, &participants, &[heat]))
        })
        .await?;
    Ok(Json(entries))
}

async fn add_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<NewHeatParticipant>,
) -> Result<Json<HeatParticipant>> {
    let session = state.require_admin(&headers).await?;
    let heat = db::heats::get(&state.pool, &id)
        .await
        .map_err(not_found("Heat"))?;
    let participant = db::participants::get(&state.pool, &req.participant_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::Validation("Unknown participant".to_string()),
            other => other.into(),
        })?;
    if participant.game_id != heat.game_id {
        return Err(AppError::Validation(
            "Participant is not entered in this heat's game".to_string(),
        ));
    }

    let entry = db::heats::insert_entry(&state.pool, &heat.id, req).await?;
    state.cache.invalidate(&[keys::HEAT_PARTICIPANTS]).await;
    audit::log_admin_action(&session.username, "create", "heat_participant", &entry.id);

    Ok(Json(entry))
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<HeatParticipantUpdate>,
) -> Result<Json<HeatParticipant>> {
    let session = state.require_admin(&headers).await?;

    let entry = db::heats::update_entry(&state.pool, &id, req)
        .await
        .map_err(not_found("Heat entry"))?;
    state.cache.invalidate(&[keys::HEAT_PARTICIPANTS]).await;
    audit::log_admin_action(&session.username, "update", "heat_participant", &id);

    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let session = state.require_admin(&headers).await?;

    deleted(db::heats::delete_entry(&state.pool, &id).await?, "Heat entry")?;
    state.cache.invalidate(&[keys::HEAT_PARTICIPANTS]).await;
    audit::log_admin_action(&session.username, "delete", "heat_participant", &id);

    Ok(Json(serde_json::json!({ "success": true })))
}
