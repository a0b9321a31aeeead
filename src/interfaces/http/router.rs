//! API router with Swagger UI

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::BookingService;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::modules::bookings::{self, BookingAppState, BookingDto};
use crate::interfaces::http::modules::health::{self, HealthState};
use crate::interfaces::http::modules::metrics::{self, MetricsState};
use crate::interfaces::http::modules::request_id::request_id_middleware;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::health_check,
        bookings::create_booking,
        bookings::extend_booking,
        bookings::get_booking,
    ),
    components(
        schemas(
            ApiResponse<BookingDto>,
            BookingDto,
            bookings::CreateBookingRequest,
            bookings::ExtendBookingRequest,
            health::LivenessResponse,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Bookings", description = "Unit bookings: create, extend, look up"),
    ),
    info(
        title = "Unit Booking Service API",
        version = "1.0.0",
        description = "Books units for guests without double-booking a unit or a guest"
    )
)]
pub struct ApiDoc;

/// Booking routes only, with their state applied.
pub fn booking_routes(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/api/v1/booking", post(bookings::create_booking))
        .route("/api/v1/booking/", post(bookings::create_booking))
        .route("/api/v1/booking/{id}", get(bookings::get_booking))
        .route("/api/v1/booking/{id}/extend", post(bookings::extend_booking))
        .with_state(BookingAppState { bookings: service })
}

/// Full HTTP surface: probes, booking API, docs and, when a recorder is
/// installed, `/metrics`.
pub fn create_api_router(
    service: Arc<BookingService>,
    db: DatabaseConnection,
    prometheus: Option<PrometheusHandle>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let health_routes = Router::new()
        .route("/", get(health::liveness))
        .route("/health", get(health::health_check))
        .with_state(HealthState::new(db));

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(health_routes)
        .merge(booking_routes(service));

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
