pub mod database;

pub use database::DatabaseStorage;

use crate::domain::{
    Category, Like, NewCategory, NewLike, NewRating, NewShop, NewUser, Rating, Shop, ShopQuery,
    User, UserRole,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence seam for the API: one implementation talks to libSQL, tests
/// can stand in their own.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn create_user(&self, new: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>>;
    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>>;
    async fn count_users(&self) -> Result<i64>;
    /// Update the profile fields (names, contacts, image, password hash).
    async fn update_user(&self, user: &User) -> Result<()>;
    /// Remove the user together with their ratings and likes, keeping shop
    /// aggregates consistent.
    async fn delete_user(&self, id: i64) -> Result<()>;
    async fn set_user_role(&self, id: i64, role: UserRole) -> Result<()>;
    async fn set_user_password(&self, id: i64, hashed_password: &str) -> Result<()>;
    async fn set_verification_code(
        &self,
        id: i64,
        code: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> Result<()>;
    async fn mark_user_verified(&self, id: i64) -> Result<()>;
    async fn touch_last_login(&self, id: i64) -> Result<()>;

    // Categories
    async fn create_category(&self, new: NewCategory) -> Result<Category>;
    async fn get_category_by_id(&self, id: i64) -> Result<Option<Category>>;
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn update_category(&self, category: &Category) -> Result<()>;
    async fn delete_category(&self, id: i64) -> Result<()>;

    // Shops
    async fn create_shop(&self, new: NewShop) -> Result<Shop>;
    async fn get_shop_by_id(&self, id: i64) -> Result<Option<Shop>>;
    async fn get_shop_by_name(&self, name: &str) -> Result<Option<Shop>>;
    async fn list_shops(&self, query: &ShopQuery) -> Result<Vec<Shop>>;
    async fn update_shop(&self, shop: &Shop) -> Result<()>;
    /// Remove the shop together with its ratings and likes.
    async fn delete_shop(&self, id: i64) -> Result<()>;
    async fn set_shop_featured(&self, id: i64, is_featured: bool) -> Result<()>;
    /// Recompute `rating` and `rating_count` from the rating rows.
    async fn refresh_shop_rating(&self, shop_id: i64) -> Result<()>;
    /// Bump `like_count` by `delta`, clamped at zero.
    async fn adjust_shop_like_count(&self, shop_id: i64, delta: i64) -> Result<()>;

    // Ratings
    async fn create_rating(&self, new: NewRating) -> Result<Rating>;
    async fn get_rating_by_id(&self, id: i64) -> Result<Option<Rating>>;
    async fn get_rating_by_user_and_shop(&self, user_id: i64, shop_id: i64)
        -> Result<Option<Rating>>;
    async fn list_ratings_for_shop(&self, shop_id: i64) -> Result<Vec<Rating>>;
    async fn update_rating(&self, rating: &Rating) -> Result<()>;
    async fn delete_rating(&self, id: i64) -> Result<()>;

    // Likes
    async fn create_like(&self, new: NewLike) -> Result<Like>;
    async fn get_like_by_id(&self, id: i64) -> Result<Option<Like>>;
    async fn get_like_by_user_and_shop(&self, user_id: i64, shop_id: i64) -> Result<Option<Like>>;
    async fn list_likes(&self) -> Result<Vec<Like>>;
    async fn list_likes_for_user(&self, user_id: i64) -> Result<Vec<Like>>;
    async fn delete_like(&self, id: i64) -> Result<()>;
}
