use super::{deleted, require_text, AppState};
use crate::{
    audit,
    cache::{self, keys},
    db::{
        self,
        circulars::{CircularUpdate, NewCircular},
        models::{Circular, CompetitionLevel},
    },
    error::Result,
    ranking,
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
pub struct CircularListQuery {
    #[serde(default, deserialize_with = "ranking::optional_filter")]
    pub level: Option<CompetitionLevel>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_circulars).post(create_circular))
        .route("/:id", put(update_circular).delete(delete_circular))
}

async fn list_circulars(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CircularListQuery>,
) -> Result<Json<Value>> {
    let level = query.level.map(|l| format!("{:?}", l));
    let key = cache::key(keys::CIRCULARS, &[("level", level.as_deref())]);

    let circulars = state
        .cache
        .get_or_load(key, || async {
            Ok(db::circulars::list(&state.pool, query.level).await?)
        })
        .await?;
    Ok(Json(circulars))
}

async fn create_circular(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewCircular>,
) -> Result<Json<Circular>> {
    let session = state.require_admin(&headers).await?;
    require_text(&req.title, "Title")?;
    require_text(&req.content, "Content")?;
    require_text(&req.sender_name, "Sender name")?;

    let circular = db::circulars::insert(&state.pool, req).await?;
    state.cache.invalidate(&[keys::CIRCULARS]).await;
    audit::log_admin_action(&session.username, "create", "circular", &circular.id);

    Ok(Json(circular))
}

async fn update_circular(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<CircularUpdate>,
) -> Result<Json<Circular>> {
    let session = state.require_admin(&headers).await?;
    for (value, field) in [
        (&req.title, "Title"),
        (&req.content, "Content"),
        (&req.sender_name, "Sender name"),
    ] {
        if let Some(value) = value {
            require_text(value, field)?;
        }
    }

    let circular = db::circulars::update(&state.pool, &id, req).await?;
    state.cache.invalidate(&[keys::CIRCULARS]).await;
    audit::log_admin_action(&session.username, "update", "circular", &id);

    Ok(Json(circular))
}

async fn delete_circular(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let session = state.require_admin(&headers).await?;

    deleted(db::circulars::delete(&state.pool, &id).await?, "Circular")?;
    state.cache.invalidate(&[keys::CIRCULARS]).await;
    audit::log_admin_action(&session.username, "delete", "circular", &id);

    Ok(Json(serde_json::json!({ "success": true })))
}
