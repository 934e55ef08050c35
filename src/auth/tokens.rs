use crate::config::AppConfig;
use crate::error::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user's login.
    pub sub: String,
    pub exp: usize,
}

fn sign(config: &AppConfig, login: &str, lifetime: Duration) -> Result<String> {
    let claims = Claims {
        sub: login.to_string(),
        exp: (Utc::now() + lifetime).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )?;
    Ok(token)
}

pub fn create_access_token(config: &AppConfig, login: &str) -> Result<String> {
    sign(config, login, Duration::minutes(config.access_token_expire_minutes))
}

pub fn create_refresh_token(config: &AppConfig, login: &str) -> Result<String> {
    sign(config, login, Duration::days(config.refresh_token_expire_days))
}

/// Decode a token and return its claims. Expired or tampered tokens fail.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}
