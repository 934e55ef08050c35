use super::tokens;
use crate::domain::{User, UserRole};
use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Could not validate credentials".to_string())
}

/// The authenticated user behind a `Bearer` token.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(invalid_credentials)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(invalid_credentials)?;

        let claims =
            tokens::decode_token(&state.config, token).map_err(|_| invalid_credentials())?;

        let user = state
            .storage
            .get_user_by_login(&claims.sub)
            .await?
            .ok_or_else(invalid_credentials)?;

        Ok(CurrentUser(user))
    }
}

/// Same as [`CurrentUser`], but rejects anyone who is not an admin.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(ApiError::Forbidden(
                "Operation not permitted for non-admin users".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}
