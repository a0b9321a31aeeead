//! Per-request HTTP metrics
//!
//! - `booking_http_requests_total`: counter by `method`, `route`, `status`
//! - `booking_http_request_duration_seconds`: histogram by `method`, `route`
//!
//! Routes are labelled by their matched template (`/api/v1/booking/{id}`),
//! so booking ids never become label values. Unmatched paths share the
//! `unmatched` label.

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

const SCRAPE_ROUTE: &str = "/metrics";

pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let route = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => "unmatched".to_string(),
    };
    if route == SCRAPE_ROUTE {
        return next.run(request).await;
    }
    let method = request.method().as_str().to_string();

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    metrics::counter!(
        "booking_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!(
        "booking_http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(elapsed);

    response
}
