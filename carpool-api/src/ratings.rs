use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use carpool_core::identity::AuthContext;
use carpool_core::query::{Page, PageQuery, ReviewQuery};
use carpool_core::rating::{NewRating, RatingView, RideRating, SuspendRequest};
use carpool_core::user::{RoleStatus, User};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::ensure_admin;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ratings/suspend/{user_id}", put(suspend_user))
        .route("/api/ratings/unsuspend/{user_id}", put(unsuspend_user))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ratings", get(list_ratings).post(create_rating))
        .route("/api/ratings/driver/{driver_id}", get(driver_ratings))
}

/// GET /api/ratings (admin)
async fn list_ratings(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Query(query), _): WithRejection<Query<ReviewQuery>, AppError>,
) -> ApiResult<Page<RatingView>> {
    ensure_admin(&ctx)?;
    let filter = query.validate()?;
    let page = state.ratings.list_ratings(&filter).await?;
    Ok(ApiResponse::ok(page.map(RatingView::from)))
}

/// POST /api/ratings
async fn create_rating(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Json(new), _): WithRejection<Json<NewRating>, AppError>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<RideRating>>), AppError> {
    let new = new.validate()?;
    let rating = state.ratings.create_rating(ctx.user_id, &new).await?;
    tracing::info!(
        rating_id = %rating.id,
        booking_id = %rating.booking_id,
        target_user_id = %rating.target_user_id,
        "Ride rated"
    );
    Ok(ApiResponse::created("Rating submitted successfully", rating))
}

/// GET /api/ratings/driver/{driver_id}
async fn driver_ratings(
    State(state): State<AppState>,
    WithRejection(Path(driver_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, AppError>,
) -> ApiResult<Page<RatingView>> {
    let page = query.validate()?;
    let ratings = state.ratings.ratings_for_driver(driver_id, page).await?;
    Ok(ApiResponse::ok(ratings.map(RatingView::from)))
}

/// The suspend body is optional; an empty request carries no reason.
fn suspend_request(body: &Bytes) -> Result<SuspendRequest, AppError> {
    if body.is_empty() {
        return Ok(SuspendRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

/// PUT /api/ratings/suspend/{user_id}
async fn suspend_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
    body: Bytes,
) -> ApiResult<User> {
    let req = suspend_request(&body)?;
    let user = state.users.set_role_status(user_id, RoleStatus::Suspended).await?;
    tracing::warn!(
        %user_id,
        by = %ctx.user_id,
        reason = req.reason.as_deref().unwrap_or("none given"),
        "User suspended"
    );
    Ok(ApiResponse::with_message("User suspended", user))
}

/// PUT /api/ratings/unsuspend/{user_id}
async fn unsuspend_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
) -> ApiResult<User> {
    let user = state.users.set_role_status(user_id, RoleStatus::Approved).await?;
    tracing::info!(%user_id, by = %ctx.user_id, "User unsuspended");
    Ok(ApiResponse::with_message("User unsuspended", user))
}
