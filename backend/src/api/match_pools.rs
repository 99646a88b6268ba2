use super::{deleted, AppState};
use crate::{
    audit,
    cache::{self, keys},
    db::{
        self,
        match_pools::{MatchPoolUpdate, NewMatchPool},
        models::MatchPool,
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

#[derive(Debug, Deserialize)]
pub struct MatchPoolListQuery {
    pub game_id: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_match_pools).post(create_match_pool))
        .route("/:id", put(update_match_pool).delete(delete_match_pool))
}

/// A winner has to be one of the two teams when both are known.
fn check_winner(
    team_a: Option<&str>,
    team_b: Option<&str>,
    winner: Option<&str>,
) -> Result<()> {
    match (winner, team_a, team_b) {
        (Some(w), Some(a), Some(b)) if w != a && w != b => Err(AppError::Validation(
            "Winner must be one of the competing schools".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Every school a pool names has to exist.
async fn check_schools(state: &AppState, school_ids: [Option<&str>; 3]) -> Result<()> {
    for id in school_ids.into_iter().flatten().filter(|id| !id.trim().is_empty()) {
        db::schools::get(&state.pool, id).await.map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::Validation("Unknown school".to_string()),
            other => other.into(),
        })?;
    }
    Ok(())
}

/// The value a field will hold after an update. Blank clears it.
fn effective<'a>(change: &'a Option<String>, current: &'a Option<String>) -> Option<&'a str> {
    match change {
        Some(v) => Some(v.as_str()).filter(|v| !v.trim().is_empty()),
        None => current.as_deref(),
    }
}

async fn list_match_pools(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchPoolListQuery>,
) -> Result<Json<Value>> {
    let game_id = query.game_id.filter(|g| !g.is_empty());
    let key = cache::key(keys::MATCH_POOLS, &[("game", game_id.as_deref())]);

    let pools = state
        .cache
        .get_or_load(key, || async {
            Ok(db::match_pools::list_detailed(&state.pool, game_id.as_deref()).await?)
        })
        .await?;
    Ok(Json(pools))
}

async fn create_match_pool(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewMatchPool>,
) -> Result<Json<MatchPool>> {
    let session = state.require_admin(&headers).await?;
    db::games::get(&state.pool, &req.game_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::Validation("Unknown game".to_string()),
            other => other.into(),
        })?;
    let named = [
        req.team_a_school_id.as_deref(),
        req.team_b_school_id.as_deref(),
        req.winner_school_id.as_deref(),
    ];
    check_schools(&state, named).await?;
    check_winner(named[0], named[1], named[2])?;

    let pool = db::match_pools::insert(&state.pool, req).await?;
    state.cache.invalidate(&[keys::MATCH_POOLS]).await;
    audit::log_admin_action(&session.username, "create", "match_pool", &pool.id);

    Ok(Json(pool))
}

async fn update_match_pool(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<MatchPoolUpdate>,
) -> Result<Json<MatchPool>> {
    let session = state.require_admin(&headers).await?;

    let current = db::match_pools::get(&state.pool, &id).await?;
    let team_a = effective(&req.team_a_school_id, &current.team_a_school_id);
    let team_b = effective(&req.team_b_school_id, &current.team_b_school_id);
    let winner = effective(&req.winner_school_id, &current.winner_school_id);
    check_schools(&state, [team_a, team_b, winner]).await?;
    check_winner(team_a, team_b, winner)?;

    let pool = db::match_pools::update(&state.pool, &id, req).await?;
    state.cache.invalidate(&[keys::MATCH_POOLS]).await;
    audit::log_admin_action(&session.username, "update", "match_pool", &id);

    Ok(Json(pool))
}

async fn delete_match_pool(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let session = state.require_admin(&headers).await?;

    deleted(db::match_pools::delete(&state.pool, &id).await?, "Match pool")?;
    state.cache.invalidate(&[keys::MATCH_POOLS]).await;
    audit::log_admin_action(&session.username, "delete", "match_pool", &id);

    Ok(Json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winner_must_be_a_competitor() {
        assert!(check_winner(Some("a"), Some("b"), Some("a")).is_ok());
        assert!(check_winner(Some("a"), Some("b"), Some("c")).is_err());
        assert!(check_winner(None, Some("b"), Some("c")).is_ok());
        assert!(check_winner(Some("a"), Some("b"), None).is_ok());
    }
}
