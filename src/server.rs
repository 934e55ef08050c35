use crate::metrics::track_requests;
use crate::routes;
use crate::state::AppState;
use axum::http::Method;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(json!({"message": "Service is up"}))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "bazaar-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create the HTTP router with all routes
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::categories::router())
        .merge(routes::shops::router())
        .merge(routes::likes::router())
        .merge(routes::ratings::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Start the HTTP server on the specified address
pub async fn start_server(
    state: AppState,
    metrics_handle: PrometheusHandle,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let app = create_app(state)
        .layer(axum::middleware::from_fn(track_requests))
        // Registered after the tracking layer so scrapes don't count themselves
        .route(
            "/metrics",
            get(move || async move { metrics_handle.render() }),
        );

    println!("🚀 HTTP server running on http://{}", addr);
    println!("💚 Health check: http://{}/health", addr);
    println!("📊 Metrics:      http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
