use super::{page_params, MessageResponse, UserRead, UserResponse};
use crate::auth::extract::{AdminUser, CurrentUser};
use crate::auth::password;
use crate::domain::UserRole;
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::validation;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(me))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/role", patch(update_role))
}

#[derive(Debug, Deserialize)]
struct Pagination {
    skip: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct UserListResponse {
    total: i64,
    users: Vec<UserRead>,
    page: i64,
    size: i64,
}

#[derive(Debug, Deserialize)]
struct UserUpdate {
    firstname: Option<String>,
    lastname: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    password: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleUpdate {
    role: UserRole,
}

fn not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<UserListResponse>> {
    let (skip, limit) = page_params(pagination.skip, pagination.limit)?;

    let total = state.storage.count_users().await?;
    let users = state.storage.list_users(skip, limit).await?;

    Ok(Json(UserListResponse {
        total,
        users: users.into_iter().map(UserRead::from).collect(),
        page: skip / limit + 1,
        size: limit,
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserRead> {
    Json(user.into())
}

async fn get_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<UserRead>> {
    let user = state.storage.get_user_by_id(id).await?.ok_or_else(not_found)?;

    if current.id != user.id && current.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Not authorized to access this user".to_string(),
        ));
    }
    Ok(Json(user.into()))
}

async fn update_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let mut user = state.storage.get_user_by_id(id).await?.ok_or_else(not_found)?;

    if current.id != user.id && current.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Not authorized to update this user".to_string(),
        ));
    }

    if let Some(firstname) = payload.firstname {
        validation::validate_name("Firstname", &firstname)?;
        user.firstname = firstname;
    }
    if let Some(lastname) = payload.lastname {
        validation::validate_name("Lastname", &lastname)?;
        user.lastname = lastname;
    }
    if let Some(phone) = payload.phone {
        validation::validate_phone(&phone)?;
        user.phone = Some(phone);
    }
    if let Some(email) = payload.email {
        validation::validate_email(&email)?;
        user.email = Some(email);
    }
    if let Some(image_url) = payload.image_url {
        user.image_url = Some(image_url);
    }
    if let Some(password) = payload.password {
        validation::validate_password(&password)?;
        user.hashed_password = password::hash_password(&password)?;
    }

    state.storage.update_user(&user).await?;
    let user = state.storage.get_user_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user: user.into(),
    }))
}

async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let user = state.storage.get_user_by_id(id).await?.ok_or_else(not_found)?;

    if current.id != user.id && current.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this user".to_string(),
        ));
    }

    state.storage.delete_user(user.id).await?;
    info!("Deleted user {}", user.login);

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

async fn update_role(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<UserResponse>> {
    let user = state.storage.get_user_by_id(id).await?.ok_or_else(not_found)?;

    state.storage.set_user_role(user.id, payload.role).await?;
    let user = state.storage.get_user_by_id(id).await?.ok_or_else(not_found)?;

    info!("Changed role of user {} to {}", user.login, user.role);
    Ok(Json(UserResponse {
        message: "User role updated successfully".to_string(),
        user: user.into(),
    }))
}
