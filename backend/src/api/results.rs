//! Read-only result views: the overall score table, qualified teams by game,
//! and the headline counts shown on the home page.

use super::AppState;
use crate::{
    cache::{self, keys},
    db::{
        self,
        models::{Game, GameCategory, Participant, School},
    },
    error::Result,
    ranking::{self, ResultFilter},
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryCount {
    pub category: GameCategory,
    pub label: &'static str,
    pub games: usize,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_games: usize,
    pub participants: usize,
    pub schools: usize,
    pub qualified: usize,
    pub categories: Vec<CategoryCount>,
}

impl Stats {
    pub fn from_rows(games: &[Game], participants: &[Participant], schools: &[School]) -> Self {
        Self {
            total_games: games.len(),
            participants: participants.len(),
            schools: schools.len(),
            qualified: participants.iter().filter(|p| p.is_qualified).count(),
            categories: GameCategory::ALL
                .iter()
                .map(|category| CategoryCount {
                    category: *category,
                    label: category.label(),
                    games: games.iter().filter(|g| g.category == *category).count(),
                })
                .collect(),
        }
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rankings", get(rankings))
        .route("/qualified", get(qualified))
        .route("/stats", get(stats))
}

fn filter_key(namespace: &str, filter: &ResultFilter) -> String {
    let level = filter.level.map(|l| format!("{:?}", l));
    let gender = filter.gender.map(|g| format!("{:?}", g));
    let school_level = filter.school_level.map(|s| format!("{:?}", s));
    let location = filter.location().map(str::to_lowercase);
    cache::key(
        namespace,
        &[
            ("level", level.as_deref()),
            ("gender", gender.as_deref()),
            ("school_level", school_level.as_deref()),
            ("location", location.as_deref()),
        ],
    )
}

async fn load_rows(state: &AppState) -> Result<(Vec<Game>, Vec<Participant>, Vec<School>)> {
    let games = db::games::list(&state.pool, None).await?;
    let participants = db::participants::list(&state.pool, None).await?;
    let schools = db::schools::list(&state.pool).await?;
    Ok((games, participants, schools))
}

async fn rankings(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ResultFilter>,
) -> Result<Json<Value>> {
    let key = filter_key(keys::RANKINGS, &filter);
    let table = state
        .cache
        .get_or_load(key, || async {
            let (games, participants, schools) = load_rows(&state).await?;
            Ok(ranking::aggregate_scores(&games, &participants, &schools, &filter))
        })
        .await?;
    Ok(Json(table))
}

/// Location does not narrow this view.
async fn qualified(
    State(state): State<Arc<AppState>>,
    Query(mut filter): Query<ResultFilter>,
) -> Result<Json<Value>> {
    filter.location = None;
    let key = filter_key(keys::QUALIFIED, &filter);
    let groups = state
        .cache
        .get_or_load(key, || async {
            let (games, participants, schools) = load_rows(&state).await?;
            Ok(ranking::qualified_by_game(&games, &participants, &schools, &filter))
        })
        .await?;
    Ok(Json(groups))
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let stats = state
        .cache
        .get_or_load(keys::STATS.to_string(), || async {
            let (games, participants, schools) = load_rows(&state).await?;
            Ok(Stats::from_rows(&games, &participants, &schools))
        })
        .await?;
    Ok(Json(stats))
}
