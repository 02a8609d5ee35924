use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use skyway_booking::{
    Booking, BookingFilter, BookingStatus, CreateBookingRequest, PaymentIntentRequest,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::middleware::CustomerClaims;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingResponse {
    message: &'static str,
    booking: Booking,
    notification_sent: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CancelBookingRequest {
    booking_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelBookingResponse {
    message: &'static str,
    notification_sent: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentIntentResponse {
    client_secret: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListParams {
    status: Option<String>,
}

impl ListParams {
    fn status(&self) -> Result<Option<BookingStatus>, AppError> {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: skyway_booking::models::UnknownStatus| AppError::ValidationError(e.to_string())),
        }
    }
}

/// Customers may only book, pay and cancel on their own account.
fn ensure_caller_owns(claims: &CustomerClaims, owner: Uuid) -> Result<(), AppError> {
    if claims.sub == owner.to_string() {
        return Ok(());
    }
    warn!(caller = %claims.sub, owner = %owner, "Request on behalf of another customer rejected");
    Err(AppError::AuthorizationError(
        "Not allowed to act on behalf of another customer".to_string(),
    ))
}

/// Ownership is only checked for well-formed ids; malformed ones fail validation downstream.
fn requested_owner(user_id: Option<&str>) -> Option<Uuid> {
    user_id.and_then(|s| Uuid::parse_str(s.trim()).ok())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings/createBookings", post(create_booking))
        .route("/bookings/getBookings", get(list_bookings))
        .route("/bookings/getBookings/{user_id}", get(list_user_bookings))
        .route("/bookings/cancelBooking", post(cancel_booking))
        .route("/bookings/create-payment-intent", post(create_payment_intent))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    AppJson(req): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    info!(caller = %claims.sub, "Create booking requested");
    if let Some(owner) = requested_owner(req.user_id.as_deref()) {
        ensure_caller_owns(&claims, owner)?;
    }
    let outcome = state.bookings.create_booking(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            message: "Booking created successfully",
            booking: outcome.booking,
            notification_sent: outcome.notification_sent,
        }),
    ))
}

async fn list_bookings(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let filter = BookingFilter {
        owner: None,
        status: params.status()?,
    };
    Ok(Json(state.bookings.list_bookings(&filter).await?))
}

async fn list_user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let owner = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::ValidationError("Invalid userId format".to_string()))?;
    let filter = BookingFilter {
        owner: Some(owner),
        status: params.status()?,
    };
    Ok(Json(state.bookings.list_bookings(&filter).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    AppJson(req): AppJson<CancelBookingRequest>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let booking_id = req
        .booking_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("Missing required fields: bookingId".to_string()))?;

    info!(caller = %claims.sub, booking_id = %booking_id, "Cancel booking requested");
    let id = Uuid::parse_str(booking_id.trim())
        .map_err(|_| AppError::NotFoundError("Booking not found".to_string()))?;
    let booking = state.bookings.get_booking(id).await?;
    ensure_caller_owns(&claims, booking.user_id)?;

    let outcome = state.bookings.cancel_booking(&id.to_string()).await?;

    Ok(Json(CancelBookingResponse {
        message: "Booking cancelled successfully. Refund will be processed within 7 business days.",
        notification_sent: outcome.notification_sent,
    }))
}

async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    AppJson(req): AppJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    if let Some(owner) = requested_owner(req.user_id.as_deref()) {
        ensure_caller_owns(&claims, owner)?;
    }
    let intent = state.payments.create_payment_intent(req).await?;
    let client_secret = intent
        .client_secret
        .ok_or_else(|| AppError::BadGateway(format!("Intent {} has no client secret", intent.id)))?;

    Ok(Json(PaymentIntentResponse { client_secret }))
}
