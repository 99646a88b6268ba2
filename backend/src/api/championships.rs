use super::{deleted, require_text, AppState};
use crate::{
    audit,
    cache::keys,
    db::{
        self,
        championships::{ChampionshipUpdate, NewChampionship},
        models::Championship,
    },
    error::Result,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// How many championships the home page announces.
const UPCOMING_LIMIT: usize = 3;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_championships).post(create_championship))
        .route("/upcoming", get(upcoming_championships))
        .route("/:id", put(update_championship).delete(delete_championship))
}

async fn list_championships(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let championships = state
        .cache
        .get_or_load(keys::CHAMPIONSHIPS.to_string(), || async {
            Ok(db::championships::list(&state.pool).await?)
        })
        .await?;
    Ok(Json(championships))
}

/// Not cached: the result depends on today's date.
async fn upcoming_championships(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Championship>>> {
    let championships = db::championships::list(&state.pool).await?;
    let today = Utc::now().date_naive();
    Ok(Json(db::championships::upcoming(
        &championships,
        today,
        UPCOMING_LIMIT,
    )))
}

async fn create_championship(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewChampionship>,
) -> Result<Json<Championship>> {
    let session = state.require_admin(&headers).await?;
    require_text(&req.name, "Championship name")?;

    let championship = db::championships::insert(&state.pool, req).await?;
    state.cache.invalidate(&[keys::CHAMPIONSHIPS]).await;
    audit::log_admin_action(&session.username, "create", "championship", &championship.id);

    Ok(Json(championship))
}

async fn update_championship(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ChampionshipUpdate>,
) -> Result<Json<Championship>> {
    let session = state.require_admin(&headers).await?;
    if let Some(name) = &req.name {
        require_text(name, "Championship name")?;
    }

    let championship = db::championships::update(&state.pool, &id, req).await?;
    state.cache.invalidate(&[keys::CHAMPIONSHIPS]).await;
    audit::log_admin_action(&session.username, "update", "championship", &id);

    Ok(Json(championship))
}

/// Games of the championship keep existing with the reference cleared.
async fn delete_championship(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let session = state.require_admin(&headers).await?;

    deleted(db::championships::delete(&state.pool, &id).await?, "Championship")?;
    state
        .cache
        .invalidate(&[keys::CHAMPIONSHIPS, keys::GAMES, keys::PARTICIPANTS])
        .await;
    audit::log_admin_action(&session.username, "delete", "championship", &id);

    Ok(Json(serde_json::json!({ "success": true })))
}
