use anyhow::Context;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub is_production: bool,
    pub session_hours: i64,
    pub cache_ttl_secs: u64,
    pub auth: AuthConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Privileged key accepted by the maintenance endpoint. Empty disables it.
    pub service_role_key: String,
    /// Accept plain-text admin passwords and re-hash them on first login.
    pub legacy_password_migration: bool,
}

#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let is_production = env::var("ZARODA_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => {
                if is_production && secret.len() < 32 {
                    anyhow::bail!("JWT_SECRET must be at least 32 characters in production");
                }
                secret
            }
            Err(_) => {
                if is_production {
                    anyhow::bail!("JWT_SECRET environment variable must be set in production");
                }
                tracing::warn!("WARNING: Using default JWT secret. Set JWT_SECRET in production!");
                "development_secret_key_change_in_production".to_string()
            }
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a number")?;

        let session_hours = env::var("SESSION_HOURS")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .context("SESSION_HOURS must be a number")?;

        let cache_ttl_secs = env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("CACHE_TTL_SECS must be a number")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:zaroda.db".to_string()),
            jwt_secret,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port,
            cors_allowed_origins,
            is_production,
            session_hours,
            cache_ttl_secs,
            auth: AuthConfig::from_env(is_production),
            bootstrap_admin: BootstrapAdmin::from_env(),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl AuthConfig {
    pub fn from_env(is_production: bool) -> Self {
        let service_role_key = env::var("SERVICE_ROLE_KEY").unwrap_or_default();
        let legacy_password_migration = env::var("LEGACY_PASSWORD_MIGRATION")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(true);

        if service_role_key.is_empty() {
            tracing::warn!("SERVICE_ROLE_KEY is not set; the maintenance endpoint is disabled.");
        }
        if is_production && legacy_password_migration {
            tracing::warn!(
                "Legacy plain-text admin passwords are accepted. Set LEGACY_PASSWORD_MIGRATION=false once all admins are migrated."
            );
        }

        Self {
            service_role_key,
            legacy_password_migration,
        }
    }

    pub fn maintenance_enabled(&self) -> bool {
        !self.service_role_key.is_empty()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            service_role_key: String::new(),
            legacy_password_migration: true,
        }
    }
}

impl BootstrapAdmin {
    fn from_env() -> Option<Self> {
        let username = env::var("ADMIN_USERNAME").ok()?;
        let password = env::var("ADMIN_PASSWORD").ok()?;
        if username.trim().is_empty() || password.is_empty() {
            return None;
        }
        Some(Self {
            username: username.trim().to_string(),
            password,
        })
    }
}
