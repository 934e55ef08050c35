use crate::error::ApiError;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Client => "client",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "client" => Ok(UserRole::Client),
            other => Err(ApiError::Database {
                message: format!("unknown user role '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub login: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub verification_code_expires: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a user row; timestamps and id are assigned by storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub login: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub hashed_password: String,
    pub role: UserRole,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub work_time: String,
    pub description: String,
    pub category_id: i64,
    pub seller_phone: String,
    pub image_urls: Vec<String>,
    pub rating: f64,
    pub rating_count: i64,
    pub like_count: i64,
    pub location_lat: f64,
    pub location_long: f64,
    pub location_str: String,
    pub is_featured: bool,
    pub expiration_months: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shop {
    /// Expiry computed from a creation time and a listing duration in months.
    pub fn expiry_from(created_at: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
        u32::try_from(months)
            .ok()
            .and_then(|m| created_at.checked_add_months(Months::new(m)))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| at < Utc::now()).unwrap_or(false)
    }

    pub fn is_available(&self) -> bool {
        self.is_active && !self.is_expired()
    }
}

#[derive(Debug, Clone)]
pub struct NewShop {
    pub name: String,
    pub work_time: String,
    pub description: String,
    pub category_id: i64,
    pub seller_phone: String,
    pub image_urls: Vec<String>,
    pub rating: f64,
    pub rating_count: i64,
    pub like_count: i64,
    pub location_lat: f64,
    pub location_long: f64,
    pub location_str: String,
    pub is_featured: bool,
    pub expiration_months: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub shop_id: i64,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub user_id: i64,
    pub shop_id: i64,
    pub rating: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub shop_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLike {
    pub user_id: i64,
    pub shop_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Rating,
    Name,
    CreatedAt,
    LikeCount,
    RatingCount,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Rating => "rating",
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
            SortField::LikeCount => "like_count",
            SortField::RatingCount => "rating_count",
        }
    }
}

impl FromStr for SortField {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(SortField::Rating),
            "name" => Ok(SortField::Name),
            "created_at" => Ok(SortField::CreatedAt),
            "like_count" => Ok(SortField::LikeCount),
            "rating_count" => Ok(SortField::RatingCount),
            _ => Err(ApiError::Validation(
                "sort_by must be one of rating, name, created_at, like_count, rating_count"
                    .to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ApiError::Validation(
                "sort_order must be either asc or desc".to_string(),
            )),
        }
    }
}

/// Filters, ordering and pagination for the shop listing.
#[derive(Debug, Clone)]
pub struct ShopQuery {
    pub category_id: Option<i64>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub skip: i64,
    pub limit: i64,
}

impl Default for ShopQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            featured: None,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            skip: 0,
            limit: 10,
        }
    }
}

impl ShopQuery {
    /// Listings at the default ordering are shuffled instead of sorted.
    pub fn uses_default_order(&self) -> bool {
        self.sort_by == SortField::Rating && self.sort_order == SortOrder::Desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_shop(expires_at: Option<DateTime<Utc>>, is_active: bool) -> Shop {
        let now = Utc::now();
        Shop {
            id: 1,
            name: "Test Shop".to_string(),
            work_time: "09:00 - 18:00".to_string(),
            description: "A shop".to_string(),
            category_id: 1,
            seller_phone: "+998901234567".to_string(),
            image_urls: vec![],
            rating: 0.0,
            rating_count: 0,
            like_count: 0,
            location_lat: 39.65,
            location_long: 66.95,
            location_str: "Sektor 101".to_string(),
            is_featured: false,
            expiration_months: 12,
            expires_at,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn shop_with_future_expiry_is_available() {
        let shop = sample_shop(Some(Utc::now() + Duration::days(30)), true);
        assert!(!shop.is_expired());
        assert!(shop.is_available());
    }

    #[test]
    fn shop_past_expiry_is_unavailable() {
        let shop = sample_shop(Some(Utc::now() - Duration::days(1)), true);
        assert!(shop.is_expired());
        assert!(!shop.is_available());
    }

    #[test]
    fn inactive_shop_is_unavailable_even_without_expiry() {
        let shop = sample_shop(None, false);
        assert!(!shop.is_expired());
        assert!(!shop.is_available());
    }

    #[test]
    fn expiry_adds_whole_months() {
        let created = "2025-01-15T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let expires = Shop::expiry_from(created, 12).unwrap();
        assert_eq!(expires, "2026-01-15T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn negative_expiration_months_yields_no_expiry() {
        assert!(Shop::expiry_from(Utc::now(), -3).is_none());
    }

    #[test]
    fn sort_params_parse_and_reject() {
        assert_eq!("like_count".parse::<SortField>().unwrap(), SortField::LikeCount);
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("likes".parse::<SortField>().is_err());
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn default_query_uses_random_order() {
        let query = ShopQuery::default();
        assert!(query.uses_default_order());

        let by_name = ShopQuery {
            sort_by: SortField::Name,
            ..ShopQuery::default()
        };
        assert!(!by_name.uses_default_order());
    }

    #[test]
    fn user_role_round_trips_through_storage_form() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::Client.as_str(), "client");
        assert!("owner".parse::<UserRole>().is_err());
    }
}
