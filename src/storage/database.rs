use super::Storage;
use crate::db::DatabaseManager;
use crate::domain::{
    Category, Like, NewCategory, NewLike, NewRating, NewShop, NewUser, Rating, Shop, ShopQuery,
    User, UserRole,
};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Row, Value};
use std::sync::Arc;
use tracing::debug;

const USER_COLUMNS: &str = "id, firstname, lastname, login, phone, email, image_url, \
     hashed_password, role, is_verified, is_active, verification_code, \
     verification_code_expires, last_login, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, description, icon_url, created_at";

const SHOP_COLUMNS: &str = "id, name, work_time, description, category_id, seller_phone, \
     image_urls, rating, rating_count, like_count, location_lat, location_long, location_str, \
     is_featured, expiration_months, expires_at, is_active, created_at, updated_at";

const RATING_COLUMNS: &str = "id, user_id, shop_id, rating, created_at, updated_at";

const LIKE_COLUMNS: &str = "id, user_id, shop_id, created_at";

/// Storage implementation over Turso/libSQL.
pub struct DatabaseStorage {
    db: Arc<DatabaseManager>,
}

impl DatabaseStorage {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    fn conn(&self) -> Connection {
        self.db.connection()
    }

    async fn collect_shop_ids(&self, sql: &str, id: i64) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut rows = conn
            .query(sql, libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to query shop ids", e))?;

        let mut ids = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            let shop_id: i64 = row.get(0).map_err(|e| db_err("Failed to get shop_id", e))?;
            ids.push(shop_id);
        }
        Ok(ids)
    }

    /// Recount `like_count` from the like rows, used when likes are removed
    /// in bulk (user deletion).
    async fn refresh_shop_like_count(&self, shop_id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE shops SET like_count = (SELECT COUNT(*) FROM likes WHERE shop_id = ?1) WHERE id = ?1",
            libsql::params![shop_id],
        )
        .await
        .map_err(|e| db_err("Failed to refresh like count", e))?;
        Ok(())
    }
}

fn db_err(context: &str, e: impl std::fmt::Display) -> ApiError {
    ApiError::Database {
        message: format!("{context}: {e}"),
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| db_err(&format!("Invalid timestamp '{value}'"), e))
}

fn opt_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

fn row_to_user(row: &Row) -> Result<User> {
    let role_text: String = row.get(8).map_err(|e| db_err("Failed to get role", e))?;
    let is_verified: i64 = row
        .get(9)
        .map_err(|e| db_err("Failed to get is_verified", e))?;
    let is_active: i64 = row
        .get(10)
        .map_err(|e| db_err("Failed to get is_active", e))?;
    let verification_code_expires: Option<String> = row.get(12).ok();
    let last_login: Option<String> = row.get(13).ok();
    let created_at: String = row
        .get(14)
        .map_err(|e| db_err("Failed to get created_at", e))?;
    let updated_at: String = row
        .get(15)
        .map_err(|e| db_err("Failed to get updated_at", e))?;

    Ok(User {
        id: row.get(0).map_err(|e| db_err("Failed to get id", e))?,
        firstname: row
            .get(1)
            .map_err(|e| db_err("Failed to get firstname", e))?,
        lastname: row
            .get(2)
            .map_err(|e| db_err("Failed to get lastname", e))?,
        login: row.get(3).map_err(|e| db_err("Failed to get login", e))?,
        phone: row.get(4).ok(),
        email: row.get(5).ok(),
        image_url: row.get(6).ok(),
        hashed_password: row
            .get(7)
            .map_err(|e| db_err("Failed to get hashed_password", e))?,
        role: role_text.parse()?,
        is_verified: is_verified != 0,
        is_active: is_active != 0,
        verification_code: row.get(11).ok(),
        verification_code_expires: opt_timestamp(verification_code_expires)?,
        last_login: opt_timestamp(last_login)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_category(row: &Row) -> Result<Category> {
    let created_at: String = row
        .get(4)
        .map_err(|e| db_err("Failed to get created_at", e))?;

    Ok(Category {
        id: row.get(0).map_err(|e| db_err("Failed to get id", e))?,
        name: row.get(1).map_err(|e| db_err("Failed to get name", e))?,
        description: row.get(2).ok(),
        icon_url: row.get(3).ok(),
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_shop(row: &Row) -> Result<Shop> {
    let image_urls_json: String = row
        .get(6)
        .map_err(|e| db_err("Failed to get image_urls", e))?;
    let image_urls: Vec<String> = serde_json::from_str(&image_urls_json)
        .map_err(|e| db_err("Failed to decode image_urls", e))?;
    let is_featured: i64 = row
        .get(13)
        .map_err(|e| db_err("Failed to get is_featured", e))?;
    let expires_at: Option<String> = row.get(15).ok();
    let is_active: i64 = row
        .get(16)
        .map_err(|e| db_err("Failed to get is_active", e))?;
    let created_at: String = row
        .get(17)
        .map_err(|e| db_err("Failed to get created_at", e))?;
    let updated_at: String = row
        .get(18)
        .map_err(|e| db_err("Failed to get updated_at", e))?;

    Ok(Shop {
        id: row.get(0).map_err(|e| db_err("Failed to get id", e))?,
        name: row.get(1).map_err(|e| db_err("Failed to get name", e))?,
        work_time: row
            .get(2)
            .map_err(|e| db_err("Failed to get work_time", e))?,
        description: row
            .get(3)
            .map_err(|e| db_err("Failed to get description", e))?,
        category_id: row
            .get(4)
            .map_err(|e| db_err("Failed to get category_id", e))?,
        seller_phone: row
            .get(5)
            .map_err(|e| db_err("Failed to get seller_phone", e))?,
        image_urls,
        rating: row.get(7).map_err(|e| db_err("Failed to get rating", e))?,
        rating_count: row
            .get(8)
            .map_err(|e| db_err("Failed to get rating_count", e))?,
        like_count: row
            .get(9)
            .map_err(|e| db_err("Failed to get like_count", e))?,
        location_lat: row
            .get(10)
            .map_err(|e| db_err("Failed to get location_lat", e))?,
        location_long: row
            .get(11)
            .map_err(|e| db_err("Failed to get location_long", e))?,
        location_str: row
            .get(12)
            .map_err(|e| db_err("Failed to get location_str", e))?,
        is_featured: is_featured != 0,
        expiration_months: row
            .get(14)
            .map_err(|e| db_err("Failed to get expiration_months", e))?,
        expires_at: opt_timestamp(expires_at)?,
        is_active: is_active != 0,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_rating(row: &Row) -> Result<Rating> {
    let created_at: String = row
        .get(4)
        .map_err(|e| db_err("Failed to get created_at", e))?;
    let updated_at: String = row
        .get(5)
        .map_err(|e| db_err("Failed to get updated_at", e))?;

    Ok(Rating {
        id: row.get(0).map_err(|e| db_err("Failed to get id", e))?,
        user_id: row.get(1).map_err(|e| db_err("Failed to get user_id", e))?,
        shop_id: row.get(2).map_err(|e| db_err("Failed to get shop_id", e))?,
        rating: row.get(3).map_err(|e| db_err("Failed to get rating", e))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_like(row: &Row) -> Result<Like> {
    let created_at: String = row
        .get(3)
        .map_err(|e| db_err("Failed to get created_at", e))?;

    Ok(Like {
        id: row.get(0).map_err(|e| db_err("Failed to get id", e))?,
        user_id: row.get(1).map_err(|e| db_err("Failed to get user_id", e))?,
        shop_id: row.get(2).map_err(|e| db_err("Failed to get shop_id", e))?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (firstname, lastname, login, phone, email, image_url, \
             hashed_password, role, is_verified, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            libsql::params![
                new.firstname.as_str(),
                new.lastname.as_str(),
                new.login.as_str(),
                new.phone.as_deref(),
                new.email.as_deref(),
                new.image_url.as_deref(),
                new.hashed_password.as_str(),
                new.role.as_str(),
                new.is_verified as i64,
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| db_err("Failed to insert user", e))?;

        let id = conn.last_insert_rowid();
        debug!("Created user {} ({})", new.login, id);

        Ok(User {
            id,
            firstname: new.firstname,
            lastname: new.lastname,
            login: new.login,
            phone: new.phone,
            email: new.email,
            image_url: new.image_url,
            hashed_password: new.hashed_password,
            role: new.role,
            is_verified: new.is_verified,
            is_active: true,
            verification_code: None,
            verification_code_expires: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                libsql::params![id],
            )
            .await
            .map_err(|e| db_err("Failed to query user", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE login = ?"),
                libsql::params![login],
            )
            .await
            .map_err(|e| db_err("Failed to query user", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?"),
                libsql::params![limit, skip],
            )
            .await
            .map_err(|e| db_err("Failed to query users", e))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    async fn count_users(&self) -> Result<i64> {
        let conn = self.conn();
        let mut rows = conn
            .query("SELECT COUNT(*) FROM users", libsql::params![])
            .await
            .map_err(|e| db_err("Failed to count users", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => row.get(0).map_err(|e| db_err("Failed to get count", e)),
            None => Ok(0),
        }
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE users SET firstname = ?, lastname = ?, phone = ?, email = ?, \
             image_url = ?, hashed_password = ?, updated_at = ? WHERE id = ?",
            libsql::params![
                user.firstname.as_str(),
                user.lastname.as_str(),
                user.phone.as_deref(),
                user.email.as_deref(),
                user.image_url.as_deref(),
                user.hashed_password.as_str(),
                Utc::now().to_rfc3339(),
                user.id
            ],
        )
        .await
        .map_err(|e| db_err("Failed to update user", e))?;
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<()> {
        let rated = self
            .collect_shop_ids("SELECT DISTINCT shop_id FROM ratings WHERE user_id = ?", id)
            .await?;
        let liked = self
            .collect_shop_ids("SELECT DISTINCT shop_id FROM likes WHERE user_id = ?", id)
            .await?;

        let conn = self.conn();
        conn.execute("DELETE FROM ratings WHERE user_id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete user ratings", e))?;
        conn.execute("DELETE FROM likes WHERE user_id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete user likes", e))?;
        conn.execute("DELETE FROM users WHERE id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete user", e))?;

        for shop_id in rated {
            self.refresh_shop_rating(shop_id).await?;
        }
        for shop_id in liked {
            self.refresh_shop_like_count(shop_id).await?;
        }

        debug!("Deleted user {}", id);
        Ok(())
    }

    async fn set_user_role(&self, id: i64, role: UserRole) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE users SET role = ?, updated_at = ? WHERE id = ?",
            libsql::params![role.as_str(), Utc::now().to_rfc3339(), id],
        )
        .await
        .map_err(|e| db_err("Failed to update role", e))?;
        Ok(())
    }

    async fn set_user_password(&self, id: i64, hashed_password: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE users SET hashed_password = ?, updated_at = ? WHERE id = ?",
            libsql::params![hashed_password, Utc::now().to_rfc3339(), id],
        )
        .await
        .map_err(|e| db_err("Failed to update password", e))?;
        Ok(())
    }

    async fn set_verification_code(
        &self,
        id: i64,
        code: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE users SET verification_code = ?, verification_code_expires = ? WHERE id = ?",
            libsql::params![code, expires.map(|at| at.to_rfc3339()), id],
        )
        .await
        .map_err(|e| db_err("Failed to update verification code", e))?;
        Ok(())
    }

    async fn mark_user_verified(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE users SET is_verified = 1, verification_code = NULL, \
             verification_code_expires = NULL, updated_at = ? WHERE id = ?",
            libsql::params![Utc::now().to_rfc3339(), id],
        )
        .await
        .map_err(|e| db_err("Failed to mark user verified", e))?;
        Ok(())
    }

    async fn touch_last_login(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE users SET last_login = ? WHERE id = ?",
            libsql::params![Utc::now().to_rfc3339(), id],
        )
        .await
        .map_err(|e| db_err("Failed to update last login", e))?;
        Ok(())
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO categories (name, description, icon_url, created_at) VALUES (?, ?, ?, ?)",
            libsql::params![
                new.name.as_str(),
                new.description.as_deref(),
                new.icon_url.as_deref(),
                now.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| db_err("Failed to insert category", e))?;

        let id = conn.last_insert_rowid();
        debug!("Created category {} ({})", new.name, id);

        Ok(Category {
            id,
            name: new.name,
            description: new.description,
            icon_url: new.icon_url,
            created_at: now,
        })
    }

    async fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"),
                libsql::params![id],
            )
            .await
            .map_err(|e| db_err("Failed to query category", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?"),
                libsql::params![name],
            )
            .await
            .map_err(|e| db_err("Failed to query category", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id"),
                libsql::params![],
            )
            .await
            .map_err(|e| db_err("Failed to query categories", e))?;

        let mut categories = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            categories.push(row_to_category(&row)?);
        }
        Ok(categories)
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE categories SET name = ?, description = ?, icon_url = ? WHERE id = ?",
            libsql::params![
                category.name.as_str(),
                category.description.as_deref(),
                category.icon_url.as_deref(),
                category.id
            ],
        )
        .await
        .map_err(|e| db_err("Failed to update category", e))?;
        Ok(())
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM categories WHERE id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete category", e))?;
        Ok(())
    }

    async fn create_shop(&self, new: NewShop) -> Result<Shop> {
        let conn = self.conn();
        let now = Utc::now();
        let expires_at = Shop::expiry_from(now, new.expiration_months);
        let image_urls_json = serde_json::to_string(&new.image_urls)
            .map_err(|e| db_err("Failed to encode image_urls", e))?;

        conn.execute(
            "INSERT INTO shops (name, work_time, description, category_id, seller_phone, \
             image_urls, rating, rating_count, like_count, location_lat, location_long, \
             location_str, is_featured, expiration_months, expires_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            libsql::params![
                new.name.as_str(),
                new.work_time.as_str(),
                new.description.as_str(),
                new.category_id,
                new.seller_phone.as_str(),
                image_urls_json.as_str(),
                new.rating,
                new.rating_count,
                new.like_count,
                new.location_lat,
                new.location_long,
                new.location_str.as_str(),
                new.is_featured as i64,
                new.expiration_months,
                expires_at.map(|at| at.to_rfc3339()),
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| db_err("Failed to insert shop", e))?;

        let id = conn.last_insert_rowid();
        debug!("Created shop {} ({})", new.name, id);

        Ok(Shop {
            id,
            name: new.name,
            work_time: new.work_time,
            description: new.description,
            category_id: new.category_id,
            seller_phone: new.seller_phone,
            image_urls: new.image_urls,
            rating: new.rating,
            rating_count: new.rating_count,
            like_count: new.like_count,
            location_lat: new.location_lat,
            location_long: new.location_long,
            location_str: new.location_str,
            is_featured: new.is_featured,
            expiration_months: new.expiration_months,
            expires_at,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_shop_by_id(&self, id: i64) -> Result<Option<Shop>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = ?"),
                libsql::params![id],
            )
            .await
            .map_err(|e| db_err("Failed to query shop", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_shop(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_shop_by_name(&self, name: &str) -> Result<Option<Shop>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {SHOP_COLUMNS} FROM shops WHERE name = ? LIMIT 1"),
                libsql::params![name],
            )
            .await
            .map_err(|e| db_err("Failed to query shop", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_shop(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_shops(&self, query: &ShopQuery) -> Result<Vec<Shop>> {
        let mut sql = format!("SELECT {SHOP_COLUMNS} FROM shops");
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(category_id) = query.category_id {
            clauses.push("category_id = ?");
            values.push(Value::Integer(category_id));
        }
        if let Some(featured) = query.featured {
            clauses.push("is_featured = ?");
            values.push(Value::Integer(featured as i64));
        }
        if let Some(search) = &query.search {
            clauses.push(
                "(LOWER(name) LIKE ? OR LOWER(description) LIKE ? OR LOWER(location_str) LIKE ?)",
            );
            let pattern = format!("%{}%", search.to_lowercase());
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if query.uses_default_order() {
            sql.push_str(" ORDER BY RANDOM()");
        } else {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                query.sort_by.column(),
                query.sort_order.keyword()
            ));
        }

        sql.push_str(" LIMIT ? OFFSET ?");
        values.push(Value::Integer(query.limit));
        values.push(Value::Integer(query.skip));

        let conn = self.conn();
        let mut rows = conn
            .query(&sql, values)
            .await
            .map_err(|e| db_err("Failed to query shops", e))?;

        let mut shops = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            shops.push(row_to_shop(&row)?);
        }
        Ok(shops)
    }

    async fn update_shop(&self, shop: &Shop) -> Result<()> {
        let conn = self.conn();
        let image_urls_json = serde_json::to_string(&shop.image_urls)
            .map_err(|e| db_err("Failed to encode image_urls", e))?;

        conn.execute(
            "UPDATE shops SET name = ?, work_time = ?, description = ?, category_id = ?, \
             seller_phone = ?, image_urls = ?, location_lat = ?, location_long = ?, \
             location_str = ?, is_featured = ?, expiration_months = ?, expires_at = ?, \
             is_active = ?, updated_at = ? WHERE id = ?",
            libsql::params![
                shop.name.as_str(),
                shop.work_time.as_str(),
                shop.description.as_str(),
                shop.category_id,
                shop.seller_phone.as_str(),
                image_urls_json.as_str(),
                shop.location_lat,
                shop.location_long,
                shop.location_str.as_str(),
                shop.is_featured as i64,
                shop.expiration_months,
                shop.expires_at.map(|at| at.to_rfc3339()),
                shop.is_active as i64,
                Utc::now().to_rfc3339(),
                shop.id
            ],
        )
        .await
        .map_err(|e| db_err("Failed to update shop", e))?;
        Ok(())
    }

    async fn delete_shop(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        // Ratings and likes go first so no rows are left pointing at a
        // missing shop.
        conn.execute("DELETE FROM ratings WHERE shop_id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete shop ratings", e))?;
        conn.execute("DELETE FROM likes WHERE shop_id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete shop likes", e))?;
        conn.execute("DELETE FROM shops WHERE id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete shop", e))?;

        debug!("Deleted shop {}", id);
        Ok(())
    }

    async fn set_shop_featured(&self, id: i64, is_featured: bool) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE shops SET is_featured = ?, updated_at = ? WHERE id = ?",
            libsql::params![is_featured as i64, Utc::now().to_rfc3339(), id],
        )
        .await
        .map_err(|e| db_err("Failed to update featured flag", e))?;
        Ok(())
    }

    async fn refresh_shop_rating(&self, shop_id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE shops SET \
             rating = COALESCE((SELECT AVG(rating) FROM ratings WHERE shop_id = ?1), 0), \
             rating_count = (SELECT COUNT(*) FROM ratings WHERE shop_id = ?1) \
             WHERE id = ?1",
            libsql::params![shop_id],
        )
        .await
        .map_err(|e| db_err("Failed to refresh shop rating", e))?;
        Ok(())
    }

    async fn adjust_shop_like_count(&self, shop_id: i64, delta: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE shops SET like_count = MAX(like_count + ?, 0) WHERE id = ?",
            libsql::params![delta, shop_id],
        )
        .await
        .map_err(|e| db_err("Failed to adjust like count", e))?;
        Ok(())
    }

    async fn create_rating(&self, new: NewRating) -> Result<Rating> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO ratings (user_id, shop_id, rating, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
            libsql::params![
                new.user_id,
                new.shop_id,
                new.rating,
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| db_err("Failed to insert rating", e))?;

        Ok(Rating {
            id: conn.last_insert_rowid(),
            user_id: new.user_id,
            shop_id: new.shop_id,
            rating: new.rating,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_rating_by_id(&self, id: i64) -> Result<Option<Rating>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {RATING_COLUMNS} FROM ratings WHERE id = ?"),
                libsql::params![id],
            )
            .await
            .map_err(|e| db_err("Failed to query rating", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_rating(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_rating_by_user_and_shop(
        &self,
        user_id: i64,
        shop_id: i64,
    ) -> Result<Option<Rating>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = ? AND shop_id = ?"),
                libsql::params![user_id, shop_id],
            )
            .await
            .map_err(|e| db_err("Failed to query rating", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_rating(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_ratings_for_shop(&self, shop_id: i64) -> Result<Vec<Rating>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {RATING_COLUMNS} FROM ratings WHERE shop_id = ? ORDER BY id"),
                libsql::params![shop_id],
            )
            .await
            .map_err(|e| db_err("Failed to query ratings", e))?;

        let mut ratings = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            ratings.push(row_to_rating(&row)?);
        }
        Ok(ratings)
    }

    async fn update_rating(&self, rating: &Rating) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE ratings SET rating = ?, updated_at = ? WHERE id = ?",
            libsql::params![rating.rating, Utc::now().to_rfc3339(), rating.id],
        )
        .await
        .map_err(|e| db_err("Failed to update rating", e))?;
        Ok(())
    }

    async fn delete_rating(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM ratings WHERE id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete rating", e))?;
        Ok(())
    }

    async fn create_like(&self, new: NewLike) -> Result<Like> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO likes (user_id, shop_id, created_at) VALUES (?, ?, ?)",
            libsql::params![new.user_id, new.shop_id, now.to_rfc3339()],
        )
        .await
        .map_err(|e| db_err("Failed to insert like", e))?;

        Ok(Like {
            id: conn.last_insert_rowid(),
            user_id: new.user_id,
            shop_id: new.shop_id,
            created_at: now,
        })
    }

    async fn get_like_by_id(&self, id: i64) -> Result<Option<Like>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {LIKE_COLUMNS} FROM likes WHERE id = ?"),
                libsql::params![id],
            )
            .await
            .map_err(|e| db_err("Failed to query like", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_like(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_like_by_user_and_shop(&self, user_id: i64, shop_id: i64) -> Result<Option<Like>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {LIKE_COLUMNS} FROM likes WHERE user_id = ? AND shop_id = ?"),
                libsql::params![user_id, shop_id],
            )
            .await
            .map_err(|e| db_err("Failed to query like", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(row_to_like(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_likes(&self) -> Result<Vec<Like>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {LIKE_COLUMNS} FROM likes ORDER BY id"),
                libsql::params![],
            )
            .await
            .map_err(|e| db_err("Failed to query likes", e))?;

        let mut likes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            likes.push(row_to_like(&row)?);
        }
        Ok(likes)
    }

    async fn list_likes_for_user(&self, user_id: i64) -> Result<Vec<Like>> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {LIKE_COLUMNS} FROM likes WHERE user_id = ? ORDER BY id"),
                libsql::params![user_id],
            )
            .await
            .map_err(|e| db_err("Failed to query likes", e))?;

        let mut likes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_err("Failed to read row", e))?
        {
            likes.push(row_to_like(&row)?);
        }
        Ok(likes)
    }

    async fn delete_like(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM likes WHERE id = ?", libsql::params![id])
            .await
            .map_err(|e| db_err("Failed to delete like", e))?;
        Ok(())
    }
}
