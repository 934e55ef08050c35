use super::MessageResponse;
use crate::auth::extract::{AdminUser, CurrentUser};
use crate::domain::{Category, NewCategory};
use crate::error::{ApiError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category).get(list_categories))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

#[derive(Debug, Deserialize)]
struct CategoryCreate {
    name: String,
    description: Option<String>,
    icon_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryUpdate {
    name: Option<String>,
    description: Option<String>,
    icon_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct CategoryRead {
    id: i64,
    name: String,
    description: Option<String>,
    icon_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<Category> for CategoryRead {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            icon_url: category.icon_url,
            created_at: category.created_at,
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Category not found".to_string())
}

fn duplicate_name() -> ApiError {
    ApiError::BadRequest("Category with this name already exists".to_string())
}

async fn create_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<CategoryCreate>,
) -> Result<Json<CategoryRead>> {
    if state
        .storage
        .get_category_by_name(&payload.name)
        .await?
        .is_some()
    {
        return Err(duplicate_name());
    }

    let category = state
        .storage
        .create_category(NewCategory {
            name: payload.name,
            description: payload.description,
            icon_url: payload.icon_url,
        })
        .await?;

    Ok(Json(category.into()))
}

async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<CategoryRead>>> {
    let categories = state.storage.list_categories().await?;
    Ok(Json(categories.into_iter().map(CategoryRead::from).collect()))
}

async fn get_category(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<CategoryRead>> {
    let category = state
        .storage
        .get_category_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(category.into()))
}

async fn update_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryRead>> {
    let mut category = state
        .storage
        .get_category_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    if let Some(name) = payload.name {
        if name != category.name
            && state.storage.get_category_by_name(&name).await?.is_some()
        {
            return Err(duplicate_name());
        }
        category.name = name;
    }
    if let Some(description) = payload.description {
        category.description = Some(description);
    }
    if let Some(icon_url) = payload.icon_url {
        category.icon_url = Some(icon_url);
    }

    state.storage.update_category(&category).await?;
    Ok(Json(category.into()))
}

async fn delete_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let category = state
        .storage
        .get_category_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    state.storage.delete_category(category.id).await?;
    Ok(Json(MessageResponse::new("Category deleted")))
}
