//! Booking handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::application::BookingService;
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiResponse, ValidatedJson};

use super::dto::{BookingDto, CreateBookingRequest, ExtendBookingRequest};

type BookingResult = Result<Json<ApiResponse<BookingDto>>, (StatusCode, Json<ApiResponse<BookingDto>>)>;

#[derive(Clone)]
pub struct BookingAppState {
    pub bookings: Arc<BookingService>,
}

fn error_response(err: DomainError) -> (StatusCode, Json<ApiResponse<BookingDto>>) {
    let (status, message) = match &err {
        DomainError::Rejected(reason) => (StatusCode::BAD_REQUEST, reason.as_str().to_string()),
        DomainError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "Booking not found".to_string()),
        DomainError::Storage(detail) => {
            error!(error = %detail, "Booking storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };
    (status, Json(ApiResponse::error(message)))
}

fn check_booking_id(id: i32) -> Result<(), (StatusCode, Json<ApiResponse<BookingDto>>)> {
    if id < 1 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Booking ID must be a positive integer")),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/booking",
    tag = "Bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Booking created", body = ApiResponse<BookingDto>),
        (status = 400, description = "Booking refused or malformed body"),
        (status = 422, description = "Field validation failed"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn create_booking(
    State(state): State<BookingAppState>,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> BookingResult {
    let booking = state
        .bookings
        .create_booking(request.into_candidate().map_err(error_response)?)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/booking/{id}/extend",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = ExtendBookingRequest,
    responses(
        (status = 200, description = "Booking extended", body = ApiResponse<BookingDto>),
        (status = 400, description = "Extension refused or malformed request"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Field validation failed"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn extend_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<ExtendBookingRequest>,
) -> BookingResult {
    check_booking_id(id)?;
    let booking = state
        .bookings
        .extend_booking(id, request.additional_nights)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/booking/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking found", body = ApiResponse<BookingDto>),
        (status = 400, description = "Malformed booking ID"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<i32>,
) -> BookingResult {
    check_booking_id(id)?;
    let booking = state
        .bookings
        .get_booking(id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(booking.into())))
}
