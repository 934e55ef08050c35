use crate::error::{ApiError, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::env;
use tracing::warn;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Local SQLite file path, or ":memory:" for an in-memory database.
    pub database_url: String,
    /// Remote Turso database; takes precedence over `database_url` when set
    /// together with `libsql_auth_token`.
    pub libsql_url: Option<String>,
    pub libsql_auth_token: Option<String>,

    pub bind_addr: String,

    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub verification_code_ttl_minutes: i64,

    pub default_admin_login: String,
    pub default_admin_password: String,
    pub default_admin_firstname: String,
    pub default_admin_lastname: String,

    pub eskiz_email: Option<String>,
    pub eskiz_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let secret_key = match env::var("SECRET_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                warn!("SECRET_KEY not set; using a generated key, tokens will not survive restarts");
                generate_secret_key()
            }
        };

        Ok(Self {
            database_url: env_or("DATABASE_URL", "bazaar.db"),
            libsql_url: env::var("LIBSQL_URL").ok().filter(|v| !v.is_empty()),
            libsql_auth_token: env::var("LIBSQL_AUTH_TOKEN").ok().filter(|v| !v.is_empty()),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8000"),
            secret_key,
            access_token_expire_minutes: env_parse("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            refresh_token_expire_days: env_parse("REFRESH_TOKEN_EXPIRE_DAYS", 7)?,
            verification_code_ttl_minutes: env_parse("VERIFICATION_CODE_TTL_MINUTES", 15)?,
            default_admin_login: env_or("DEFAULT_ADMIN_LOGIN", "admin"),
            default_admin_password: env_or("DEFAULT_ADMIN_PASSWORD", "Admin123!"),
            default_admin_firstname: env_or("DEFAULT_ADMIN_FIRSTNAME", "Admin"),
            default_admin_lastname: env_or("DEFAULT_ADMIN_LASTNAME", "User"),
            eskiz_email: env::var("ESKIZ_EMAIL").ok().filter(|v| !v.is_empty()),
            eskiz_password: env::var("ESKIZ_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse(key: &str, default: i64) -> Result<i64> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| ApiError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn generate_secret_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
