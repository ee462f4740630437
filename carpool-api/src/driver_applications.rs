use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use carpool_core::driver_application::{ApplicationReview, DriverApplication, ReviewRequest};
use carpool_core::identity::AuthContext;
use carpool_core::query::{ApplicationQuery, Page};
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/driver-applications", get(list_applications))
        .route(
            "/api/admin/driver-applications/{id}",
            get(get_application).put(review_application),
        )
}

/// GET /api/admin/driver-applications
async fn list_applications(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ApplicationQuery>, AppError>,
) -> ApiResult<Page<DriverApplication>> {
    let filter = query.validate()?;
    Ok(ApiResponse::ok(state.applications.list_applications(&filter).await?))
}

/// GET /api/admin/driver-applications/{id}
async fn get_application(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> ApiResult<DriverApplication> {
    Ok(ApiResponse::ok(state.applications.get_application(id).await?))
}

/// PUT /api/admin/driver-applications/{id}
///
/// Approval promotes the applicant to driver; rejection leaves them a
/// passenger. Either way the applicant's role status mirrors the decision.
async fn review_application(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<ReviewRequest>, AppError>,
) -> ApiResult<DriverApplication> {
    let req = req.validate()?;
    let review = ApplicationReview {
        decision: req.status,
        reviewer_id: ctx.user_id,
        notes: req.review_notes,
        reviewed_at: Utc::now(),
    };

    let application = state.applications.review_application(id, &review).await?;
    Ok(ApiResponse::with_message(
        format!("Driver application {}", application.status),
        application,
    ))
}
