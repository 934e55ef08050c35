use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bazaar_api::auth::codes::CodeSender;
use bazaar_api::auth::rate_limit::AuthRateLimits;
use bazaar_api::config::AppConfig;
use bazaar_api::db::DatabaseManager;
use bazaar_api::server::create_app;
use bazaar_api::state::AppState;
use bazaar_api::storage::{DatabaseStorage, Storage};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct NoopSender;

#[async_trait]
impl CodeSender for NoopSender {
    async fn send_code(&self, _login: &str, _code: &str) -> bazaar_api::error::Result<()> {
        Ok(())
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: ":memory:".to_string(),
        libsql_url: None,
        libsql_auth_token: None,
        bind_addr: "127.0.0.1:0".to_string(),
        secret_key: "integration-test-secret".to_string(),
        access_token_expire_minutes: 30,
        refresh_token_expire_days: 7,
        verification_code_ttl_minutes: 15,
        default_admin_login: "admin".to_string(),
        default_admin_password: "Admin123!".to_string(),
        default_admin_firstname: "Admin".to_string(),
        default_admin_lastname: "User".to_string(),
        eskiz_email: None,
        eskiz_password: None,
    }
}

async fn test_state() -> Result<AppState> {
    let config = test_config();
    let db = DatabaseManager::connect(&config).await?;
    db.run_migrations().await?;

    let storage = Arc::new(DatabaseStorage::new(Arc::new(db)));
    bazaar_api::auth::ensure_admin_exists(storage.as_ref(), &config).await?;

    Ok(AppState {
        storage,
        config: Arc::new(config),
        code_sender: Arc::new(NoopSender),
        rate_limits: Arc::new(AuthRateLimits::default()),
    })
}

fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))?,
        None => builder.body(Body::empty())?,
    };
    Ok(request)
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

async fn admin_token(app: &Router) -> Result<String> {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"login": "admin", "password": "Admin123!"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["access_token"].as_str().unwrap().to_string())
}

async fn client_token(app: &Router, state: &AppState, login: &str) -> Result<String> {
    let (status, _) = send(
        app,
        request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "firstname": "Test",
                "lastname": "Client",
                "login": login,
                "password": "Secret123",
            })),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let user = state.storage.get_user_by_login(login).await?.unwrap();
    state.storage.mark_user_verified(user.id).await?;

    let (status, body) = send(
        app,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"login": login, "password": "Secret123"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["access_token"].as_str().unwrap().to_string())
}

async fn create_category(app: &Router, token: &str, name: &str) -> Result<i64> {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/categories",
            Some(token),
            Some(json!({"name": name, "description": format!("{} mahsulotlari", name)})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["id"].as_i64().unwrap())
}

fn shop_payload(name: &str, category_id: i64) -> Value {
    json!({
        "name": name,
        "work_time": "09:00 - 18:00",
        "description": format!("{} uchun tovarlar", name),
        "category_id": category_id,
        "seller_phone": "+998901234567",
        "location_lat": 39.65,
        "location_long": 66.96,
        "location_str": "Sektor 101, Do'kon 5",
        "image_urls": ["https://picsum.photos/seed/shop1/1600/1200"],
    })
}

async fn create_shop(app: &Router, token: &str, name: &str, category_id: i64) -> Result<i64> {
    let (status, body) = send(
        app,
        request("POST", "/shops", Some(token), Some(shop_payload(name, category_id)))?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["id"].as_i64().unwrap())
}

#[tokio::test]
async fn category_crud_with_admin_gate() -> Result<()> {
    let state = test_state().await?;
    let app = create_app(state.clone());
    let admin = admin_token(&app).await?;
    let client = client_token(&app, &state, "buyer_01").await?;

    // Listing requires a token
    let (status, _) = send(&app, request("GET", "/categories", None, None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let id = create_category(&app, &admin, "Elektronika").await?;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/categories",
            Some(&admin),
            Some(json!({"name": "Elektronika"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Category with this name already exists");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/categories",
            Some(&client),
            Some(json!({"name": "Kitoblar"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Operation not permitted for non-admin users");

    let (status, body) = send(&app, request("GET", "/categories", Some(&client), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/categories/{}", id),
            Some(&admin),
            Some(json!({"description": "Gadjetlar va texnika"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Elektronika");
    assert_eq!(body["description"], "Gadjetlar va texnika");

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/categories/{}", id), Some(&admin), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Category deleted");

    let (status, body) = send(
        &app,
        request("GET", &format!("/categories/{}", id), Some(&client), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Category not found");
    Ok(())
}

#[tokio::test]
async fn shop_create_validates_category_and_hides_lifecycle_fields() -> Result<()> {
    let state = test_state().await?;
    let app = create_app(state.clone());
    let admin = admin_token(&app).await?;
    let client = client_token(&app, &state, "buyer_01").await?;

    let (status, body) = send(
        &app,
        request("POST", "/shops", Some(&admin), Some(shop_payload("Tech Store", 999)))?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Category not found");

    let category_id = create_category(&app, &admin, "Elektronika").await?;
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/shops",
            Some(&admin),
            Some(shop_payload("Tech Store", category_id)),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Tech Store");
    assert_eq!(body["rating"], 0.0);
    assert_eq!(body["rating_count"], 0);
    assert_eq!(body["like_count"], 0);
    assert_eq!(body["is_featured"], false);
    assert!(body.get("expires_at").is_none());
    assert!(body.get("expiration_months").is_none());
    assert!(body.get("is_active").is_none());

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/shops",
            Some(&client),
            Some(shop_payload("Another", category_id)),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Operation not permitted for non-admin users");
    Ok(())
}

#[tokio::test]
async fn shop_listing_filters_compose_with_sorting_and_pagination() -> Result<()> {
    let state = test_state().await?;
    let app = create_app(state);
    let admin = admin_token(&app).await?;

    let food = create_category(&app, &admin, "Oziq-ovqat").await?;
    let tech = create_category(&app, &admin, "Elektronika").await?;

    let mut tech_shop = shop_payload("Tech Store", tech);
    tech_shop["description"] = json!("Smartfonlar va noutbuklar");
    let (status, body) = send(&app, request("POST", "/shops", Some(&admin), Some(tech_shop))?).await?;
    assert_eq!(status, StatusCode::OK);
    let tech_shop_id = body["id"].as_i64().unwrap();

    create_shop(&app, &admin, "Samarqand Non", food).await?;
    let mut butcher = shop_payload("Go'sht Do'koni", food);
    butcher["location_str"] = json!("Sektor 420, Do'kon 67");
    send(&app, request("POST", "/shops", Some(&admin), Some(butcher))?).await?;

    send(
        &app,
        request(
            "PATCH",
            &format!("/shops/{}/feature?is_featured=true", tech_shop_id),
            Some(&admin),
            None,
        )?,
    )
    .await?;

    // Listing is public
    let (status, body) = send(&app, request("GET", "/shops", None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = send(
        &app,
        request("GET", &format!("/shops?category_id={}", food), None, None)?,
    )
    .await?;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, request("GET", "/shops?featured=true", None, None)?).await?;
    let featured = body.as_array().unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["name"], "Tech Store");

    // Case-insensitive search across name, description, and location
    let (_, body) = send(&app, request("GET", "/shops?search=TECH", None, None)?).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&app, request("GET", "/shops?search=smartfon", None, None)?).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&app, request("GET", "/shops?search=420", None, None)?).await?;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Go'sht Do'koni");

    // Search composes with the category filter
    let (_, body) = send(
        &app,
        request(
            "GET",
            &format!("/shops?search=samarqand&category_id={}", food),
            None,
            None,
        )?,
    )
    .await?;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Samarqand Non");

    let (_, body) = send(
        &app,
        request("GET", "/shops?sort_by=name&sort_order=asc", None, None)?,
    )
    .await?;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|shop| shop["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Go'sht Do'koni", "Samarqand Non", "Tech Store"]);

    let (_, body) = send(
        &app,
        request("GET", "/shops?sort_by=name&sort_order=desc", None, None)?,
    )
    .await?;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|shop| shop["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Tech Store", "Samarqand Non", "Go'sht Do'koni"]);

    // Pagination rides on top of the sort
    let (_, body) = send(
        &app,
        request("GET", "/shops?sort_by=name&sort_order=asc&limit=2", None, None)?,
    )
    .await?;
    assert_eq!(body.as_array().unwrap().len(), 2);
    let (_, body) = send(
        &app,
        request(
            "GET",
            "/shops?sort_by=name&sort_order=asc&skip=2&limit=2",
            None,
            None,
        )?,
    )
    .await?;
    let tail = body.as_array().unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0]["name"], "Tech Store");

    let (status, body) = send(&app, request("GET", "/shops?sort_by=bogus", None, None)?).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"],
        "sort_by must be one of rating, name, created_at, like_count, rating_count"
    );

    let (status, body) = send(&app, request("GET", "/shops?limit=0", None, None)?).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "limit must be between 1 and 100");
    Ok(())
}

#[tokio::test]
async fn shop_update_feature_toggle_and_delete() -> Result<()> {
    let state = test_state().await?;
    let app = create_app(state.clone());
    let admin = admin_token(&app).await?;
    let client = client_token(&app, &state, "buyer_01").await?;

    let category_id = create_category(&app, &admin, "Oziq-ovqat").await?;
    let shop_id = create_shop(&app, &admin, "Samarqand Non", category_id).await?;

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/shops/{}", shop_id),
            Some(&admin),
            Some(json!({"description": "Har kuni yangi non"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Har kuni yangi non");
    assert_eq!(body["name"], "Samarqand Non");
    assert_eq!(body["category_id"], category_id);

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/shops/{}", shop_id),
            Some(&admin),
            Some(json!({"category_id": 999})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Category not found");

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/shops/{}/feature", shop_id),
            Some(&admin),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "is_featured query parameter is required");

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/shops/{}/feature?is_featured=true", shop_id),
            Some(&admin),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_featured"], true);

    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("/shops/{}/feature?is_featured=false", shop_id),
            Some(&client),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/shops/{}", shop_id), Some(&admin), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Shop deleted");

    let (status, body) = send(
        &app,
        request("GET", &format!("/shops/{}", shop_id), None, None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Shop not found");
    Ok(())
}

#[tokio::test]
async fn ratings_recompute_shop_aggregates() -> Result<()> {
    let state = test_state().await?;
    let app = create_app(state.clone());
    let admin = admin_token(&app).await?;
    let first = client_token(&app, &state, "buyer_01").await?;
    let second = client_token(&app, &state, "buyer_02").await?;

    let category_id = create_category(&app, &admin, "Oziq-ovqat").await?;
    let shop_id = create_shop(&app, &admin, "Samarqand Non", category_id).await?;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/ratings",
            Some(&first),
            Some(json!({"shop_id": shop_id, "rating": 6})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "Rating must be between 1 and 5");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/ratings",
            Some(&first),
            Some(json!({"shop_id": 999, "rating": 5})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Shop not found");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/ratings",
            Some(&first),
            Some(json!({"shop_id": shop_id, "rating": 5})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let first_rating_id = body["id"].as_i64().unwrap();
    assert_eq!(body["rating"], 5);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/ratings",
            Some(&first),
            Some(json!({"shop_id": shop_id, "rating": 4})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "You have already rated this shop. Use PATCH to update your rating."
    );

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/ratings",
            Some(&second),
            Some(json!({"shop_id": shop_id, "rating": 4})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let second_rating_id = body["id"].as_i64().unwrap();

    let (_, body) = send(&app, request("GET", &format!("/shops/{}", shop_id), None, None)?).await?;
    assert_eq!(body["rating"], 4.5);
    assert_eq!(body["rating_count"], 2);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/ratings/shop/{}", shop_id),
            Some(&first),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        request("GET", "/ratings/999", Some(&first), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Rating not found");

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/ratings/{}", second_rating_id),
            Some(&first),
            Some(json!({"rating": 1})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "You can only update your own ratings");

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/ratings/{}", first_rating_id),
            Some(&first),
            Some(json!({"rating": 3})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 3);

    let (_, body) = send(&app, request("GET", &format!("/shops/{}", shop_id), None, None)?).await?;
    assert_eq!(body["rating"], 3.5);

    let (status, body) = send(
        &app,
        request(
            "DELETE",
            &format!("/ratings/{}", second_rating_id),
            Some(&first),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "You can only delete your own ratings");

    let (status, body) = send(
        &app,
        request(
            "DELETE",
            &format!("/ratings/{}", first_rating_id),
            Some(&first),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (_, body) = send(&app, request("GET", &format!("/shops/{}", shop_id), None, None)?).await?;
    assert_eq!(body["rating"], 4.0);
    assert_eq!(body["rating_count"], 1);
    Ok(())
}

#[tokio::test]
async fn likes_adjust_shop_counters() -> Result<()> {
    let state = test_state().await?;
    let app = create_app(state.clone());
    let admin = admin_token(&app).await?;
    let first = client_token(&app, &state, "buyer_01").await?;
    let second = client_token(&app, &state, "buyer_02").await?;

    let category_id = create_category(&app, &admin, "Oziq-ovqat").await?;
    let shop_id = create_shop(&app, &admin, "Samarqand Non", category_id).await?;

    let (status, body) = send(
        &app,
        request("POST", "/likes", Some(&first), Some(json!({"shop_id": 999})))?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Shop not found");

    let (status, body) = send(
        &app,
        request("POST", "/likes", Some(&first), Some(json!({"shop_id": shop_id})))?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let first_like_id = body["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        request("POST", "/likes", Some(&first), Some(json!({"shop_id": shop_id})))?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "You already liked this shop");

    let (status, body) = send(
        &app,
        request("POST", "/likes", Some(&second), Some(json!({"shop_id": shop_id})))?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let second_like_id = body["id"].as_i64().unwrap();

    let (_, body) = send(&app, request("GET", &format!("/shops/{}", shop_id), None, None)?).await?;
    assert_eq!(body["like_count"], 2);

    // Clients see their own likes, admins see everything
    let (_, body) = send(&app, request("GET", "/likes", Some(&first), None)?).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&app, request("GET", "/likes", Some(&admin), None)?).await?;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        request(
            "DELETE",
            &format!("/likes/{}", second_like_id),
            Some(&first),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not authorized to delete this like");

    let (status, body) = send(
        &app,
        request(
            "DELETE",
            &format!("/likes/{}", first_like_id),
            Some(&first),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Like deleted");

    let (status, _) = send(
        &app,
        request(
            "DELETE",
            &format!("/likes/{}", second_like_id),
            Some(&admin),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, request("GET", &format!("/shops/{}", shop_id), None, None)?).await?;
    assert_eq!(body["like_count"], 0);

    let (status, body) = send(
        &app,
        request("DELETE", "/likes/999", Some(&admin), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Like not found");
    Ok(())
}

#[tokio::test]
async fn user_management_enforces_ownership_and_roles() -> Result<()> {
    let state = test_state().await?;
    let app = create_app(state.clone());
    let admin = admin_token(&app).await?;
    let client = client_token(&app, &state, "buyer_01").await?;

    let client_id = state
        .storage
        .get_user_by_login("buyer_01")
        .await?
        .unwrap()
        .id;
    let admin_id = state.storage.get_user_by_login("admin").await?.unwrap().id;

    let (status, _) = send(&app, request("GET", "/users", Some(&client), None)?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request("GET", "/users", Some(&admin), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 10);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        request("GET", &format!("/users/{}", admin_id), Some(&client), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not authorized to access this user");

    let (status, body) = send(
        &app,
        request("GET", &format!("/users/{}", client_id), Some(&client), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "buyer_01");

    let (status, body) = send(
        &app,
        request("GET", &format!("/users/{}", client_id), Some(&admin), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "buyer_01");

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/users/{}", admin_id),
            Some(&client),
            Some(json!({"firstname": "Intruder"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not authorized to update this user");

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/users/{}", client_id),
            Some(&client),
            Some(json!({"firstname": "Aziz", "password": "Changed123"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["user"]["firstname"], "Aziz");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"login": "buyer_01", "password": "Changed123"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/users/{}/role", client_id),
            Some(&client),
            Some(json!({"role": "admin"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Operation not permitted for non-admin users");

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/users/{}/role", client_id),
            Some(&admin),
            Some(json!({"role": "admin"})),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User role updated successfully");
    assert_eq!(body["user"]["role"], "admin");

    // Role change is visible to the existing token on the next request
    let (status, _) = send(&app, request("GET", "/users", Some(&client), None)?).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/users/{}", client_id), Some(&client), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = send(&app, request("GET", "/users/me", Some(&client), None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        request("GET", &format!("/users/{}", client_id), Some(&admin), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
    Ok(())
}

#[tokio::test]
async fn health_and_root_respond() -> Result<()> {
    let state = test_state().await?;
    let app = create_app(state);

    let (status, body) = send(&app, request("GET", "/", None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Service is up");

    let (status, body) = send(&app, request("GET", "/health", None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "bazaar-api");
    Ok(())
}
