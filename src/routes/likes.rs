use super::MessageResponse;
use crate::auth::extract::CurrentUser;
use crate::domain::{Like, NewLike, UserRole};
use crate::error::{ApiError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/likes", get(list_likes).post(create_like))
        .route("/likes/:id", delete(delete_like))
}

#[derive(Debug, Deserialize)]
struct LikeCreate {
    shop_id: i64,
}

#[derive(Debug, Serialize)]
struct LikeRead {
    id: i64,
    user_id: i64,
    shop_id: i64,
    created_at: DateTime<Utc>,
}

impl From<Like> for LikeRead {
    fn from(like: Like) -> Self {
        Self {
            id: like.id,
            user_id: like.user_id,
            shop_id: like.shop_id,
            created_at: like.created_at,
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Like not found".to_string())
}

async fn create_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<LikeCreate>,
) -> Result<Json<LikeRead>> {
    if state
        .storage
        .get_shop_by_id(payload.shop_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Shop not found".to_string()));
    }

    if state
        .storage
        .get_like_by_user_and_shop(user.id, payload.shop_id)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "You already liked this shop".to_string(),
        ));
    }

    let like = state
        .storage
        .create_like(NewLike {
            user_id: user.id,
            shop_id: payload.shop_id,
        })
        .await?;
    state.storage.adjust_shop_like_count(payload.shop_id, 1).await?;

    Ok(Json(like.into()))
}

async fn list_likes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<LikeRead>>> {
    let likes = if user.role == UserRole::Admin {
        state.storage.list_likes().await?
    } else {
        state.storage.list_likes_for_user(user.id).await?
    };

    Ok(Json(likes.into_iter().map(LikeRead::from).collect()))
}

async fn delete_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let like = state.storage.get_like_by_id(id).await?.ok_or_else(not_found)?;

    if like.user_id != user.id && user.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this like".to_string(),
        ));
    }

    state.storage.delete_like(like.id).await?;
    state.storage.adjust_shop_like_count(like.shop_id, -1).await?;

    Ok(Json(MessageResponse::new("Like deleted")))
}
