use crate::error::{ApiError, Result};
use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

pub const HTTP_REQUESTS_TOTAL: &str = "bazaar_http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "bazaar_http_request_duration_seconds";

/// Installs the Prometheus recorder and returns the handle used to render
/// the `/metrics` endpoint in-process.
pub fn init_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Config(format!("Failed to install Prometheus recorder: {}", e)))
}

/// Request-tracking middleware: counts requests and records latency, labeled
/// by method, route template, and response status.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();

    // Use the route template so path labels stay low-cardinality
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let method = req.method().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    ::metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());

    response
}
