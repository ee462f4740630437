use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use carpool_core::booking::{
    Booking, BookingListing, BookingStatus, BookingWithDistributedFare, UpdateBookingStatusRequest,
};
use carpool_core::fare;
use carpool_core::identity::AuthContext;
use carpool_core::notify::{ContactMessage, ContactRequest};
use carpool_core::query::{BookingQuery, Page};
use carpool_core::ValidationErrors;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::error::AppError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Routes behind the admin gate.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list_bookings))
        .route("/api/bookings/{id}", get(get_booking))
        .route("/api/bookings/{id}/status", put(update_booking_status))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/bookings/{id}/contact", post(contact_passenger))
}

/// A booking's share of its ride. Cancelled bookings owe nothing.
fn distribute(listing: BookingListing, counts: &HashMap<Uuid, i64>) -> BookingWithDistributedFare {
    let share = match &listing.ride {
        Some(ride) if !listing.booking.status.is_cancelled() => {
            let active = counts.get(&ride.id).copied().unwrap_or(0).max(0) as usize;
            fare::share_for(ride.total_fare_amount(), active)
        }
        _ => Decimal::ZERO,
    };
    BookingWithDistributedFare {
        listing,
        distributed_fare: share,
    }
}

/// GET /api/bookings
async fn list_bookings(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<BookingQuery>, AppError>,
) -> ApiResult<Page<BookingWithDistributedFare>> {
    let filter = query.validate()?;
    let page = state.bookings.list_bookings(&filter).await?;

    let ride_ids: Vec<Uuid> = page
        .items
        .iter()
        .map(|l| l.booking.ride_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let counts = state.bookings.active_counts(&ride_ids).await?;

    Ok(ApiResponse::ok(page.map(|l| distribute(l, &counts))))
}

/// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> ApiResult<BookingWithDistributedFare> {
    let listing = state.bookings.get_booking(id).await?;
    let counts = state.bookings.active_counts(&[listing.booking.ride_id]).await?;
    Ok(ApiResponse::ok(distribute(listing, &counts)))
}

/// PUT /api/bookings/{id}/status
async fn update_booking_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateBookingStatusRequest>, AppError>,
) -> ApiResult<Booking> {
    let status = BookingStatus::parse_known(req.status.trim()).ok_or_else(|| {
        ValidationErrors::single("status", "Status must be one of: pending, confirmed, cancelled")
    })?;

    let booking = state.bookings.update_booking_status(id, status).await?;
    tracing::info!(booking_id = %id, status = %booking.status, by = %ctx.user_id, "Booking status changed by admin");
    Ok(ApiResponse::with_message("Booking status updated", booking))
}

/// POST /api/bookings/{id}/contact
async fn contact_passenger(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<ContactRequest>, AppError>,
) -> ApiResult<ContactMessage> {
    let contact = state.bookings.booking_contact(id).await?;
    if !ctx.can_act_for(contact.driver_id) {
        return Err(AppError::AuthorizationError(
            "Only the ride's driver can contact this passenger".to_string(),
        ));
    }
    let req = req.validate()?;

    let message = ContactMessage::new(&contact, &ctx.name, ctx.email.inner(), req);
    state.notifier.send(&message).await?;
    tracing::info!(booking_id = %id, to = %message.to, "Passenger contacted");

    Ok(ApiResponse::with_message("Message sent to passenger", message))
}
