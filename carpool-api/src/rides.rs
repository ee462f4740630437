use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use carpool_core::booking::Booking;
use carpool_core::fare::{self, FareShare, FareSummary};
use carpool_core::identity::AuthContext;
use carpool_core::query::{DriverRidesQuery, Page, RideFilter, RideQuery};
use carpool_core::ride::{NewRide, Ride, RideDetail, RideListing, UpdateRideStatusRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/rides", get(list_rides).post(create_ride))
        .route("/api/rides/driver/{driver_id}", get(driver_rides))
        .route("/api/rides/{id}", get(get_ride))
        .route("/api/rides/{id}/bookings", get(ride_bookings))
        .route("/api/rides/{id}/status", put(update_ride_status))
}

#[derive(Debug, Serialize)]
pub struct RideBookings {
    pub bookings: Vec<FareShare<Booking>>,
    pub summary: FareSummary,
}

/// Loads a page of rides and annotates each with its active booking count
/// and per-passenger share, using one grouped count for the whole page.
async fn listings(state: &AppState, filter: &RideFilter) -> Result<Page<RideListing>, AppError> {
    let page = state.rides.list_rides(filter).await?;
    let ride_ids: Vec<Uuid> = page.items.iter().map(|r| r.ride.id).collect();
    let counts = state.bookings.active_counts(&ride_ids).await?;

    Ok(page.map(|r| {
        let active = counts.get(&r.ride.id).copied().unwrap_or(0);
        RideListing::new(r.ride, r.driver, active)
    }))
}

/// GET /api/rides
async fn list_rides(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<RideQuery>, AppError>,
) -> ApiResult<Page<RideListing>> {
    let filter = query.validate()?;
    Ok(ApiResponse::ok(listings(&state, &filter).await?))
}

/// GET /api/rides/driver/{driver_id}
async fn driver_rides(
    State(state): State<AppState>,
    WithRejection(Path(driver_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<DriverRidesQuery>, AppError>,
) -> ApiResult<Page<RideListing>> {
    let filter = query.validate(driver_id)?;
    Ok(ApiResponse::ok(listings(&state, &filter).await?))
}

/// POST /api/rides
async fn create_ride(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Json(new), _): WithRejection<Json<NewRide>, AppError>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<Ride>>), AppError> {
    if !(ctx.is_driver() || ctx.is_admin()) {
        return Err(AppError::AuthorizationError(
            "Only drivers can create rides".to_string(),
        ));
    }
    let new = new.validate()?;
    let ride = state.rides.create_ride(ctx.user_id, &new).await?;
    Ok(ApiResponse::created("Ride created successfully", ride))
}

/// GET /api/rides/{id}
async fn get_ride(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> ApiResult<RideDetail> {
    let record = state.rides.get_ride(id).await?;
    Ok(ApiResponse::ok(RideDetail::from(record)))
}

/// GET /api/rides/{id}/bookings
async fn ride_bookings(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> ApiResult<RideBookings> {
    let ride = state.rides.find_ride(id).await?;
    let bookings = state.bookings.bookings_for_ride(id).await?;
    let allocation = fare::allocate(ride.total_fare_amount(), &bookings);

    Ok(ApiResponse::ok(RideBookings {
        summary: allocation.summary(),
        bookings: allocation.bookings,
    }))
}

/// PUT /api/rides/{id}/status
async fn update_ride_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateRideStatusRequest>, AppError>,
) -> ApiResult<Ride> {
    let status = req.resolve()?;
    let ride = state.rides.find_ride(id).await?;
    if !ctx.can_act_for(ride.driver_id) {
        return Err(AppError::AuthorizationError(
            "Only the ride's driver can change its status".to_string(),
        ));
    }

    let updated = state.rides.update_ride_status(id, status).await?;
    tracing::info!(
        ride_id = %id,
        from = %ride.status,
        to = %updated.status,
        by = %ctx.user_id,
        "Ride status updated"
    );
    Ok(ApiResponse::with_message("Ride status updated", updated))
}
