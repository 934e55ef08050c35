use super::{MessageResponse, UserResponse};
use crate::auth::{self, password, tokens};
use crate::domain::{NewUser, User, UserRole};
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::validation;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{patch, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/send-verification", post(send_verification))
        .route("/auth/verify", post(verify))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/reset-password", patch(reset_password))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    firstname: String,
    lastname: String,
    login: String,
    password: String,
    phone: Option<String>,
    email: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginSelector {
    login: String,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    login: String,
    code: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    login: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct ResetPasswordRequest {
    login: String,
    new_password: String,
    verification_code: String,
}

#[derive(Debug, Serialize)]
struct TokenPair {
    access_token: String,
    refresh_token: String,
    token_type: String,
}

#[derive(Debug, Serialize)]
struct AccessToken {
    access_token: String,
    token_type: String,
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if !state.rate_limits.register.try_acquire(&payload.login).await {
        return Err(ApiError::TooManyRequests);
    }

    validation::validate_name("Firstname", &payload.firstname)?;
    validation::validate_name("Lastname", &payload.lastname)?;
    validation::validate_login(&payload.login)?;
    if let Some(phone) = &payload.phone {
        validation::validate_phone(phone)?;
    }
    if let Some(email) = &payload.email {
        validation::validate_email(email)?;
    }
    validation::validate_password(&payload.password)?;

    if state
        .storage
        .get_user_by_login(&payload.login)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "User with this login already exists".to_string(),
        ));
    }

    let hashed_password = password::hash_password(&payload.password)?;
    let user = state
        .storage
        .create_user(NewUser {
            firstname: payload.firstname,
            lastname: payload.lastname,
            login: payload.login,
            phone: payload.phone,
            email: payload.email,
            image_url: payload.image_url,
            hashed_password,
            role: UserRole::Client,
            is_verified: false,
        })
        .await?;

    info!("Registered user {}", user.login);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User registered successfully. Please verify your account.".to_string(),
            user: user.into(),
        }),
    ))
}

async fn send_verification(
    State(state): State<AppState>,
    Json(payload): Json<LoginSelector>,
) -> Result<Json<MessageResponse>> {
    if !state
        .rate_limits
        .send_verification
        .try_acquire(&payload.login)
        .await
    {
        return Err(ApiError::TooManyRequests);
    }

    let user = state
        .storage
        .get_user_by_login(&payload.login)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let code = auth::generate_verification_code();
    let expires = Utc::now() + Duration::minutes(state.config.verification_code_ttl_minutes);
    state
        .storage
        .set_verification_code(user.id, Some(&code), Some(expires))
        .await?;

    state.code_sender.send_code(&user.login, &code).await?;

    Ok(Json(MessageResponse::new(
        "Verification code sent successfully. Please check your phone or email.",
    )))
}

/// Check a stored verification code against a submitted one.
fn check_verification_code(user: &User, submitted: &str) -> Result<()> {
    let code = user
        .verification_code
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("No verification code found".to_string()))?;

    let expires = user
        .verification_code_expires
        .ok_or_else(|| ApiError::BadRequest("No verification code found".to_string()))?;
    if expires < Utc::now() {
        return Err(ApiError::BadRequest("Verification code expired".to_string()));
    }

    if code != submitted {
        return Err(ApiError::BadRequest("Invalid verification code".to_string()));
    }
    Ok(())
}

async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<MessageResponse>> {
    if !state.rate_limits.verify.try_acquire(&payload.login).await {
        return Err(ApiError::TooManyRequests);
    }

    let user = state
        .storage
        .get_user_by_login(&payload.login)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.is_verified {
        return Err(ApiError::BadRequest("User already verified".to_string()));
    }

    check_verification_code(&user, &payload.code)?;
    state.storage.mark_user_verified(user.id).await?;

    info!("Verified user {}", user.login);
    Ok(Json(MessageResponse::new("User verified successfully")))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>> {
    if !state.rate_limits.login.try_acquire(&payload.login).await {
        return Err(ApiError::TooManyRequests);
    }

    let user = state
        .storage
        .get_user_by_login(&payload.login)
        .await?
        .filter(|user| password::verify_password(&payload.password, &user.hashed_password))
        .ok_or_else(|| ApiError::Unauthorized("Incorrect login or password".to_string()))?;

    if !user.is_verified {
        return Err(ApiError::Unauthorized(
            "Please verify your account first".to_string(),
        ));
    }
    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    state.storage.touch_last_login(user.id).await?;

    Ok(Json(TokenPair {
        access_token: tokens::create_access_token(&state.config, &user.login)?,
        refresh_token: tokens::create_refresh_token(&state.config, &user.login)?,
        token_type: "bearer".to_string(),
    }))
}

async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AccessToken>> {
    let rejected = || ApiError::Unauthorized("Invalid refresh token".to_string());

    let claims =
        tokens::decode_token(&state.config, &payload.refresh_token).map_err(|_| rejected())?;

    if !state.rate_limits.refresh.try_acquire(&claims.sub).await {
        return Err(ApiError::TooManyRequests);
    }

    let user = state
        .storage
        .get_user_by_login(&claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(rejected)?;

    Ok(Json(AccessToken {
        access_token: tokens::create_access_token(&state.config, &user.login)?,
        token_type: "bearer".to_string(),
    }))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    if !state
        .rate_limits
        .reset_password
        .try_acquire(&payload.login)
        .await
    {
        return Err(ApiError::TooManyRequests);
    }

    let user = state
        .storage
        .get_user_by_login(&payload.login)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User not found".to_string()))?;

    if !user.is_verified {
        return Err(ApiError::BadRequest("User is not verified".to_string()));
    }

    check_verification_code(&user, &payload.verification_code)?;
    validation::validate_password(&payload.new_password)?;

    let hashed_password = password::hash_password(&payload.new_password)?;
    state
        .storage
        .set_user_password(user.id, &hashed_password)
        .await?;
    state
        .storage
        .set_verification_code(user.id, None, None)
        .await?;

    info!("Password reset for user {}", user.login);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Password reset successfully")),
    ))
}
