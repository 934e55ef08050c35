pub mod auth;
pub mod categories;
pub mod likes;
pub mod ratings;
pub mod shops;
pub mod users;

use crate::domain::{User, UserRole};
use crate::error::{ApiError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// User as shown to API clients. Credentials and verification state stay
/// server-side.
#[derive(Debug, Serialize)]
pub struct UserRead {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub login: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            login: user.login,
            phone: user.phone,
            email: user.email,
            image_url: user.image_url,
            role: user.role,
            is_verified: user.is_verified,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: UserRead,
}

/// Shared skip/limit handling: skip >= 0 (default 0), limit 1..=100
/// (default 10).
pub(crate) fn page_params(skip: Option<i64>, limit: Option<i64>) -> Result<(i64, i64)> {
    let skip = skip.unwrap_or(0);
    let limit = limit.unwrap_or(10);
    if skip < 0 {
        return Err(ApiError::Validation(
            "skip must be greater than or equal to 0".to_string(),
        ));
    }
    if !(1..=100).contains(&limit) {
        return Err(ApiError::Validation(
            "limit must be between 1 and 100".to_string(),
        ));
    }
    Ok((skip, limit))
}
