use super::{page_params, MessageResponse};
use crate::auth::extract::AdminUser;
use crate::domain::{NewShop, Shop, ShopQuery, SortField, SortOrder};
use crate::error::{ApiError, Result};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

const DEFAULT_EXPIRATION_MONTHS: i64 = 12;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shops", get(list_shops).post(create_shop))
        .route("/shops/:id", get(get_shop).put(update_shop).delete(delete_shop))
        .route("/shops/:id/feature", patch(feature_shop))
}

#[derive(Debug, Deserialize)]
struct ShopCreate {
    name: String,
    work_time: String,
    description: String,
    category_id: i64,
    seller_phone: String,
    location_lat: f64,
    location_long: f64,
    location_str: String,
    #[serde(default)]
    image_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ShopUpdate {
    name: Option<String>,
    work_time: Option<String>,
    description: Option<String>,
    category_id: Option<i64>,
    seller_phone: Option<String>,
    location_lat: Option<f64>,
    location_long: Option<f64>,
    location_str: Option<String>,
    image_urls: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ShopListParams {
    category_id: Option<i64>,
    search: Option<String>,
    featured: Option<bool>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    skip: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FeatureParams {
    is_featured: Option<bool>,
}

/// Shop as shown to API clients; listing lifecycle columns stay internal.
#[derive(Debug, Serialize)]
struct ShopRead {
    id: i64,
    name: String,
    work_time: String,
    description: String,
    category_id: i64,
    seller_phone: String,
    image_urls: Vec<String>,
    rating: f64,
    rating_count: i64,
    like_count: i64,
    location_lat: f64,
    location_long: f64,
    location_str: String,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Shop> for ShopRead {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name,
            work_time: shop.work_time,
            description: shop.description,
            category_id: shop.category_id,
            seller_phone: shop.seller_phone,
            image_urls: shop.image_urls,
            rating: shop.rating,
            rating_count: shop.rating_count,
            like_count: shop.like_count,
            location_lat: shop.location_lat,
            location_long: shop.location_long,
            location_str: shop.location_str,
            is_featured: shop.is_featured,
            created_at: shop.created_at,
            updated_at: shop.updated_at,
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Shop not found".to_string())
}

fn category_not_found() -> ApiError {
    ApiError::NotFound("Category not found".to_string())
}

async fn create_shop(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<ShopCreate>,
) -> Result<Json<ShopRead>> {
    if state
        .storage
        .get_category_by_id(payload.category_id)
        .await?
        .is_none()
    {
        return Err(category_not_found());
    }

    let shop = state
        .storage
        .create_shop(NewShop {
            name: payload.name,
            work_time: payload.work_time,
            description: payload.description,
            category_id: payload.category_id,
            seller_phone: payload.seller_phone,
            image_urls: payload.image_urls,
            rating: 0.0,
            rating_count: 0,
            like_count: 0,
            location_lat: payload.location_lat,
            location_long: payload.location_long,
            location_str: payload.location_str,
            is_featured: false,
            expiration_months: DEFAULT_EXPIRATION_MONTHS,
        })
        .await?;

    info!("Created shop {}", shop.name);
    Ok(Json(shop.into()))
}

async fn list_shops(
    State(state): State<AppState>,
    Query(params): Query<ShopListParams>,
) -> Result<Json<Vec<ShopRead>>> {
    let (skip, limit) = page_params(params.skip, params.limit)?;

    let sort_by = match params.sort_by.as_deref() {
        Some(value) => value.parse()?,
        None => SortField::default(),
    };
    let sort_order = match params.sort_order.as_deref() {
        Some(value) => value.parse()?,
        None => SortOrder::default(),
    };

    let query = ShopQuery {
        category_id: params.category_id,
        featured: params.featured,
        search: params.search,
        sort_by,
        sort_order,
        skip,
        limit,
    };

    let shops = state.storage.list_shops(&query).await?;
    Ok(Json(shops.into_iter().map(ShopRead::from).collect()))
}

async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ShopRead>> {
    let shop = state.storage.get_shop_by_id(id).await?.ok_or_else(not_found)?;
    Ok(Json(shop.into()))
}

async fn update_shop(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<ShopUpdate>,
) -> Result<Json<ShopRead>> {
    let mut shop = state.storage.get_shop_by_id(id).await?.ok_or_else(not_found)?;

    if let Some(category_id) = payload.category_id {
        if state
            .storage
            .get_category_by_id(category_id)
            .await?
            .is_none()
        {
            return Err(category_not_found());
        }
        shop.category_id = category_id;
    }
    if let Some(name) = payload.name {
        shop.name = name;
    }
    if let Some(work_time) = payload.work_time {
        shop.work_time = work_time;
    }
    if let Some(description) = payload.description {
        shop.description = description;
    }
    if let Some(seller_phone) = payload.seller_phone {
        shop.seller_phone = seller_phone;
    }
    if let Some(location_lat) = payload.location_lat {
        shop.location_lat = location_lat;
    }
    if let Some(location_long) = payload.location_long {
        shop.location_long = location_long;
    }
    if let Some(location_str) = payload.location_str {
        shop.location_str = location_str;
    }
    if let Some(image_urls) = payload.image_urls {
        shop.image_urls = image_urls;
    }

    state.storage.update_shop(&shop).await?;
    let shop = state.storage.get_shop_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(shop.into()))
}

async fn delete_shop(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let shop = state.storage.get_shop_by_id(id).await?.ok_or_else(not_found)?;

    state.storage.delete_shop(shop.id).await?;
    info!("Deleted shop {}", shop.name);

    Ok(Json(MessageResponse::new("Shop deleted")))
}

async fn feature_shop(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Query(params): Query<FeatureParams>,
) -> Result<Json<ShopRead>> {
    let is_featured = params.is_featured.ok_or_else(|| {
        ApiError::Validation("is_featured query parameter is required".to_string())
    })?;

    let shop = state.storage.get_shop_by_id(id).await?.ok_or_else(not_found)?;
    state.storage.set_shop_featured(shop.id, is_featured).await?;
    let shop = state.storage.get_shop_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(shop.into()))
}
