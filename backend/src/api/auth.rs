use super::AppState;
use crate::{
    audit,
    auth::{hash_password, password, verify_stored, PasswordCheck},
    db::{self, models::Admin},
    error::{AppError, Result},
};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminResponse,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            email: admin.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetSummary {
    pub username: String,
    pub reset_date: String,
    pub reset_time: String,
    pub admin_notified: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub success: bool,
    pub reset_summary: ResetSummary,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/reset-password", post(reset_password))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    if !state.login_throttle.allow(username).await {
        audit::log_security_event(username, "login_throttled", "too many login attempts");
        return Err(AppError::RateLimited);
    }

    let admin = db::admins::find_by_username(&state.pool, username).await?;

    // Timing-safe: always perform one bcrypt verification even when the admin is not found
    let Some(admin) = admin else {
        password::verify_dummy(&req.password);
        audit::log_auth_event(username, "login_failed", false);
        return Err(AppError::Auth("Invalid credentials".to_string()));
    };

    let check = verify_stored(
        &req.password,
        &admin.password_hash,
        state.auth_config.legacy_password_migration,
    )?;

    match check {
        PasswordCheck::Valid => {}
        PasswordCheck::ValidLegacy => migrate_legacy_password(&state, &admin, &req.password).await,
        PasswordCheck::Invalid => {
            audit::log_auth_event(username, "login_failed", false);
            return Err(AppError::Auth("Invalid credentials".to_string()));
        }
        PasswordCheck::LegacyDisabled => {
            audit::log_auth_event(username, "login_legacy_refused", false);
            return Err(AppError::Auth(
                "Password must be reset with the hash-admin-password tool".to_string(),
            ));
        }
    }

    audit::log_auth_event(&admin.username, "login", true);

    let issued = state
        .jwt_manager
        .create_token(admin.id.clone(), admin.username.clone())?;

    Ok(Json(LoginResponse {
        success: true,
        token: issued.token,
        expires_at: issued.claims.expires_at(),
        admin: admin.into(),
    }))
}

/// Replace a plain-text credential with its hash. Failure leaves the row as
/// it was and does not affect the login.
async fn migrate_legacy_password(state: &AppState, admin: &Admin, password: &str) {
    let hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!("Failed to hash legacy password for {}: {}", admin.username, e);
            return;
        }
    };

    match db::admins::update_password_hash(&state.pool, &admin.id, &hash).await {
        Ok(()) => audit::log_auth_event(&admin.username, "legacy_password_migrated", true),
        Err(e) => tracing::warn!(
            "Failed to migrate plain-text password for {}: {}",
            admin.username,
            e
        ),
    }
}

async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let session = state.require_admin(&headers).await?;
    state
        .revocations
        .revoke(&session.token_id, session.expires_at)
        .await;
    audit::log_auth_event(&session.username, "logout", true);
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<AdminResponse>> {
    let session = state.require_admin(&headers).await?;
    let admin = db::admins::get(&state.pool, &session.admin_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::Unauthorized,
            other => other.into(),
        })?;
    Ok(Json(admin.into()))
}

/// Checks that need nothing from the store.
fn validate_reset(req: &ResetPasswordRequest) -> Result<()> {
    if req.current_password.is_empty()
        || req.new_password.is_empty()
        || req.confirm_password.is_empty()
    {
        return Err(AppError::Validation("All fields are required".to_string()));
    }
    if req.new_password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    if req.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>> {
    let session = state.require_admin(&headers).await?;
    validate_reset(&req)?;

    let admin = db::admins::get(&state.pool, &session.admin_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Admin account not found".to_string()),
            other => other.into(),
        })?;

    // Legacy rows are accepted here regardless of the migration setting.
    match verify_stored(&req.current_password, &admin.password_hash, true)? {
        PasswordCheck::Valid | PasswordCheck::ValidLegacy => {}
        PasswordCheck::Invalid | PasswordCheck::LegacyDisabled => {
            audit::log_auth_event(&admin.username, "password_reset_failed", false);
            return Err(AppError::Validation("Invalid current password".to_string()));
        }
    }

    let new_hash = hash_password(&req.new_password)?;
    db::admins::update_password_hash(&state.pool, &admin.id, &new_hash).await?;

    let now = Utc::now();
    let reset_date = now.format("%B %-d, %Y").to_string();
    let reset_time = now.format("%H:%M:%S").to_string();
    audit::log_password_reset(&admin.username, &reset_date, &reset_time);

    // The admin signs in again with the new password.
    state
        .revocations
        .revoke(&session.token_id, session.expires_at)
        .await;

    Ok(Json(ResetPasswordResponse {
        success: true,
        reset_summary: ResetSummary {
            username: admin.username,
            reset_date,
            reset_time,
            admin_notified: true,
        },
    }))
}
