use super::RevocationList;
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // admin ID
    pub username: String,
    pub jti: String, // token ID, used for revocation
    pub exp: usize,  // expiration time
}

impl Claims {
    pub fn new(admin_id: String, username: String, expiration_hours: i64) -> Self {
        let exp = (Utc::now() + Duration::hours(expiration_hours)).timestamp() as usize;

        Self {
            sub: admin_id,
            username,
            jti: Uuid::new_v4().to_string(),
            exp,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    session_hours: i64,
}

impl JwtManager {
    pub fn new(secret: String, session_hours: i64) -> Self {
        Self {
            secret,
            session_hours,
        }
    }

    pub fn create_token(&self, admin_id: String, username: String) -> Result<IssuedToken> {
        let claims = Claims::new(admin_id, username, self.session_hours);

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Auth(format!("Failed to create token: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))
    }
}

/// The authenticated admin behind a request.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin_id: String,
    pub username: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub async fn from_header(
        jwt_manager: &JwtManager,
        revocations: &RevocationList,
        auth_header: &str,
    ) -> Result<Self> {
        // Bearer token format
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let claims = jwt_manager.verify_token(token)?;

        if revocations.is_revoked(&claims.jti).await {
            crate::audit::log_security_event(&claims.username, "revoked_token", &claims.jti);
            return Err(AppError::Auth("Session has been logged out".to_string()));
        }

        Ok(AdminSession {
            expires_at: claims.expires_at(),
            admin_id: claims.sub,
            username: claims.username,
            token_id: claims.jti,
        })
    }
}
