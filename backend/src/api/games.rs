use super::{deleted, require_text, AppState};
use crate::{
    audit,
    cache::{self, keys},
    db::{
        self,
        games::{GameUpdate, NewGame},
        models::{Game, GameCategory},
        participants::QualifyOutcome,
    },
    error::{AppError, Result},
    ranking,
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Everything a game write can reach: its own rows plus the cascaded ones.
const AFFECTED: [&str; 8] = [
    keys::GAMES,
    keys::PARTICIPANTS,
    keys::HEATS,
    keys::HEAT_PARTICIPANTS,
    keys::MATCH_POOLS,
    keys::RANKINGS,
    keys::QUALIFIED,
    keys::STATS,
];

/// Writes that change participant rows only.
const PARTICIPANT_VIEWS: [&str; 5] = [
    keys::PARTICIPANTS,
    keys::HEAT_PARTICIPANTS,
    keys::RANKINGS,
    keys::QUALIFIED,
    keys::STATS,
];

#[derive(Debug, Deserialize)]
pub struct GameListQuery {
    #[serde(default, deserialize_with = "ranking::optional_filter")]
    pub category: Option<GameCategory>,
}

#[derive(Debug, Deserialize)]
pub struct QualifyRequest {
    pub participant_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestedQualifiers {
    pub game_id: String,
    pub max_qualifiers: i64,
    pub participant_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RankedPosition {
    pub participant_id: String,
    pub position: i64,
}

#[derive(Debug, Serialize)]
pub struct RankByTimeResponse {
    pub game_id: String,
    pub ranked: usize,
    pub positions: Vec<RankedPosition>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_games).post(create_game))
        .route("/:id", get(get_game).put(update_game).delete(delete_game))
        .route("/:id/qualifiers", post(set_qualifiers))
        .route("/:id/qualifiers/suggested", get(suggested_qualifiers))
        .route("/:id/rank-by-time", post(rank_by_time))
        .route("/:id/heats", get(list_heats))
        .route("/:id/heat-participants", get(list_heat_participants))
}

async fn load_game(state: &AppState, id: &str) -> Result<Game> {
    db::games::get(&state.pool, id).await.map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Game not found".to_string()),
        other => other.into(),
    })
}

async fn list_games(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GameListQuery>,
) -> Result<Json<Value>> {
    let category = query.category.map(|c| format!("{:?}", c));
    let key = cache::key(keys::GAMES, &[("category", category.as_deref())]);

    let games = state
        .cache
        .get_or_load(key, || async {
            Ok(db::games::list(&state.pool, query.category).await?)
        })
        .await?;
    Ok(Json(games))
}

async fn get_game(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Value>> {
    let key = cache::key(keys::GAMES, &[("id", Some(id.as_str()))]);
    let game = state
        .cache
        .get_or_load(key, || load_game(&state, &id))
        .await?;
    Ok(Json(game))
}

fn validate_max_qualifiers(max_qualifiers: Option<i64>) -> Result<()> {
    match max_qualifiers {
        Some(n) if n < 0 => Err(AppError::Validation(
            "Max qualifiers cannot be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

async fn create_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewGame>,
) -> Result<Json<Game>> {
    let session = state.require_admin(&headers).await?;
    require_text(&req.name, "Game name")?;
    validate_max_qualifiers(req.max_qualifiers)?;

    let game = db::games::insert(&state.pool, req).await?;
    state.cache.invalidate(&[keys::GAMES, keys::STATS]).await;
    audit::log_admin_action(&session.username, "create", "game", &game.id);

    Ok(Json(game))
}

async fn update_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<GameUpdate>,
) -> Result<Json<Game>> {
    let session = state.require_admin(&headers).await?;
    if let Some(name) = &req.name {
        require_text(name, "Game name")?;
    }
    validate_max_qualifiers(req.max_qualifiers)?;

    let game = db::games::update(&state.pool, &id, req).await?;
    state.cache.invalidate(&AFFECTED).await;
    audit::log_admin_action(&session.username, "update", "game", &id);

    Ok(Json(game))
}

async fn delete_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let session = state.require_admin(&headers).await?;

    deleted(db::games::delete(&state.pool, &id).await?, "Game")?;
    state.cache.invalidate(&AFFECTED).await;
    audit::log_admin_action(&session.username, "delete", "game", &id);

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Bulk qualify: the listed participants become the game's exact qualifier set.
async fn set_qualifiers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<QualifyRequest>,
) -> Result<Json<QualifyOutcome>> {
    let session = state.require_admin(&headers).await?;
    let game = load_game(&state, &id).await?;

    let outcome = db::participants::set_qualifiers(&state.pool, &game, &req.participant_ids).await?;
    state.cache.invalidate(&PARTICIPANT_VIEWS).await;

    if outcome.exceeds_max_qualifiers {
        tracing::warn!(
            "Game {} has {} qualifiers, above its limit of {}",
            game.id,
            outcome.qualified_ids.len(),
            game.max_qualifiers
        );
    }
    audit::log_qualification_event(
        &session.username,
        &game.id,
        outcome.qualified_ids.len(),
        outcome.ignored_ids.len(),
    );

    Ok(Json(outcome))
}

async fn suggested_qualifiers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuggestedQualifiers>> {
    let game = load_game(&state, &id).await?;
    let participants = db::participants::list(&state.pool, Some(&game.id)).await?;

    Ok(Json(SuggestedQualifiers {
        participant_ids: ranking::select_top_finishers(&participants, game.max_qualifiers),
        game_id: game.id,
        max_qualifiers: game.max_qualifiers,
    }))
}

async fn rank_by_time(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<RankByTimeResponse>> {
    let session = state.require_admin(&headers).await?;
    let game = load_game(&state, &id).await?;

    let timed = db::participants::list_timed(&state.pool, &game.id).await?;
    let positions = ranking::rank_by_time(&timed);
    db::participants::apply_positions(&state.pool, &game.id, &positions).await?;
    state.cache.invalidate(&PARTICIPANT_VIEWS).await;
    audit::log_ranking_event(&session.username, &game.id, positions.len());

    Ok(Json(RankByTimeResponse {
        game_id: game.id,
        ranked: positions.len(),
        positions: positions
            .into_iter()
            .map(|(participant_id, position)| RankedPosition {
                participant_id,
                position,
            })
            .collect(),
    }))
}

async fn list_heats(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Value>> {
    let key = cache::key(keys::HEATS, &[("game", Some(id.as_str()))]);
    let heats = state
        .cache
        .get_or_load(key, || async {
            Ok(db::heats::list_for_game(&state.pool, &id).await?)
        })
        .await?;
    Ok(Json(heats))
}

/// Every heat entry of the game with its participant and heat attached.
async fn list_heat_participants(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let key = cache::key(keys::HEAT_PARTICIPANTS, &[("game", Some(id.as_str()))]);
    let entries = state
        .cache
        .get_or_load(key, || async {
            let entries = db::heats::list_entries_for_game(&state.pool, &id).await?;
            let participants = db::participants::list_detailed(&state.pool, Some(&id)).await?;
            let heats = db::heats::list_for_game(&state.pool, &id).await?;
            Ok(db::heats::attach_relations(entries, &participants, &heats))
        })
        .await?;
    Ok(Json(entries))
}
