use super::{deleted, require_text, AppState};
use crate::{
    audit,
    cache::keys,
    db::{
        self,
        models::School,
        schools::{NewSchool, SchoolUpdate},
    },
    error::Result,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

/// Views that embed school rows or depend on them.
const AFFECTED: [&str; 7] = [
    keys::SCHOOLS,
    keys::PARTICIPANTS,
    keys::HEAT_PARTICIPANTS,
    keys::MATCH_POOLS,
    keys::RANKINGS,
    keys::QUALIFIED,
    keys::STATS,
];

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_schools).post(create_school))
        .route("/:id", put(update_school).delete(delete_school))
}

async fn list_schools(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let schools = state
        .cache
        .get_or_load(keys::SCHOOLS.to_string(), || async {
            Ok(db::schools::list(&state.pool).await?)
        })
        .await?;
    Ok(Json(schools))
}

async fn create_school(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewSchool>,
) -> Result<Json<School>> {
    let session = state.require_admin(&headers).await?;
    require_text(&req.name, "School name")?;

    let school = db::schools::insert(&state.pool, req).await?;
    state.cache.invalidate(&AFFECTED).await;
    audit::log_admin_action(&session.username, "create", "school", &school.id);

    Ok(Json(school))
}

async fn update_school(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<SchoolUpdate>,
) -> Result<Json<School>> {
    let session = state.require_admin(&headers).await?;
    if let Some(name) = &req.name {
        require_text(name, "School name")?;
    }

    let school = db::schools::update(&state.pool, &id, req).await?;
    state.cache.invalidate(&AFFECTED).await;
    audit::log_admin_action(&session.username, "update", "school", &id);

    Ok(Json(school))
}

async fn delete_school(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let session = state.require_admin(&headers).await?;

    deleted(db::schools::delete(&state.pool, &id).await?, "School")?;
    state.cache.invalidate(&AFFECTED).await;
    audit::log_admin_action(&session.username, "delete", "school", &id);

    Ok(Json(serde_json::json!({ "success": true })))
}
