use crate::auth::extract::CurrentUser;
use crate::domain::{NewRating, Rating};
use crate::error::{ApiError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ratings", post(create_rating))
        .route(
            "/ratings/:id",
            get(get_rating).patch(update_rating).delete(delete_rating),
        )
        .route("/ratings/shop/:shop_id", get(list_shop_ratings))
}

#[derive(Debug, Deserialize)]
struct RatingCreate {
    shop_id: i64,
    rating: i64,
}

#[derive(Debug, Deserialize)]
struct RatingUpdate {
    rating: Option<i64>,
}

#[derive(Debug, Serialize)]
struct RatingRead {
    id: i64,
    user_id: i64,
    shop_id: i64,
    rating: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Rating> for RatingRead {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            user_id: rating.user_id,
            shop_id: rating.shop_id,
            rating: rating.rating,
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Rating not found".to_string())
}

fn check_rating_value(value: i64) -> Result<()> {
    if !(1..=5).contains(&value) {
        return Err(ApiError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

async fn create_rating(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<RatingCreate>,
) -> Result<(StatusCode, Json<RatingRead>)> {
    check_rating_value(payload.rating)?;

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
        .get_rating_by_user_and_shop(user.id, payload.shop_id)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "You have already rated this shop. Use PATCH to update your rating.".to_string(),
        ));
    }

    let rating = state
        .storage
        .create_rating(NewRating {
            user_id: user.id,
            shop_id: payload.shop_id,
            rating: payload.rating,
        })
        .await?;
    state.storage.refresh_shop_rating(payload.shop_id).await?;

    Ok((StatusCode::CREATED, Json(rating.into())))
}

async fn get_rating(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<RatingRead>> {
    let rating = state.storage.get_rating_by_id(id).await?.ok_or_else(not_found)?;
    Ok(Json(rating.into()))
}

async fn list_shop_ratings(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(shop_id): Path<i64>,
) -> Result<Json<Vec<RatingRead>>> {
    let ratings = state.storage.list_ratings_for_shop(shop_id).await?;
    Ok(Json(ratings.into_iter().map(RatingRead::from).collect()))
}

async fn update_rating(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RatingUpdate>,
) -> Result<Json<RatingRead>> {
    let mut rating = state.storage.get_rating_by_id(id).await?.ok_or_else(not_found)?;

    if rating.user_id != user.id {
        return Err(ApiError::Forbidden(
            "You can only update your own ratings".to_string(),
        ));
    }

    if let Some(value) = payload.rating {
        check_rating_value(value)?;
        rating.rating = value;
    }

    state.storage.update_rating(&rating).await?;
    state.storage.refresh_shop_rating(rating.shop_id).await?;
    let rating = state.storage.get_rating_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(rating.into()))
}

async fn delete_rating(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let rating = state.storage.get_rating_by_id(id).await?.ok_or_else(not_found)?;

    if rating.user_id != user.id {
        return Err(ApiError::Forbidden(
            "You can only delete your own ratings".to_string(),
        ));
    }

    state.storage.delete_rating(rating.id).await?;
    state.storage.refresh_shop_rating(rating.shop_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
