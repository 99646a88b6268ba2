pub mod admin;
pub mod auth;
pub mod championships;
pub mod circulars;
pub mod games;
pub mod heats;
pub mod match_pools;
pub mod participants;
pub mod results;
pub mod schools;

pub use admin::router as admin_router;
pub use auth::router as auth_router;
pub use championships::router as championships_router;
pub use circulars::router as circulars_router;
pub use games::router as games_router;
pub use heats::router as heats_router;
pub use match_pools::router as match_pools_router;
pub use participants::router as participants_router;
pub use results::router as results_router;
pub use schools::router as schools_router;

use crate::{
    auth::{AdminSession, JwtManager, LoginThrottle, RevocationList},
    cache::QueryCache,
    config::AuthConfig,
    db::DbPool,
    error::{AppError, Result},
};
use axum::http::HeaderMap;
use std::sync::Arc;

pub struct AppState {
    pub pool: DbPool,
    pub jwt_manager: Arc<JwtManager>,
    pub revocations: RevocationList,
    pub login_throttle: LoginThrottle,
    pub cache: QueryCache,
    pub auth_config: AuthConfig,
}

impl AppState {
    /// Resolve the admin session carried by the `Authorization` header.
    pub async fn require_admin(&self, headers: &HeaderMap) -> Result<AdminSession> {
        let auth_header = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        AdminSession::from_header(&self.jwt_manager, &self.revocations, auth_header).await
    }
}

/// Turn a `false` from a delete into a 404.
pub(crate) fn deleted(found: bool, entity: &str) -> Result<()> {
    if found {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} not found", entity)))
    }
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
