use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use carpool_core::feedback::{Feedback, FeedbackStats, FeedbackView, NewFeedback};
use carpool_core::identity::AuthContext;
use carpool_core::query::{Page, PageQuery, ReviewQuery};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::ensure_admin;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/feedback/stats", get(feedback_stats))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/feedback", get(list_feedback).post(create_feedback))
        .route("/api/feedback/user/{user_id}", get(user_feedback))
}

/// GET /api/feedback (admin)
async fn list_feedback(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Query(query), _): WithRejection<Query<ReviewQuery>, AppError>,
) -> ApiResult<Page<FeedbackView>> {
    ensure_admin(&ctx)?;
    let filter = query.validate()?;
    let page = state.feedback.list_feedback(&filter).await?;
    Ok(ApiResponse::ok(page.map(FeedbackView::from)))
}

/// POST /api/feedback
async fn create_feedback(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Json(new), _): WithRejection<Json<NewFeedback>, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<Feedback>>), AppError> {
    let new = new.validate()?;
    let feedback = state.feedback.create_feedback(ctx.user_id, &new).await?;
    tracing::info!(feedback_id = %feedback.id, rating = feedback.rating, "Feedback submitted");
    Ok(ApiResponse::created("Feedback submitted successfully", feedback))
}

/// GET /api/feedback/stats
async fn feedback_stats(State(state): State<AppState>) -> ApiResult<FeedbackStats> {
    let buckets = state.feedback.rating_buckets().await?;
    Ok(ApiResponse::ok(FeedbackStats::from_buckets(&buckets)))
}

/// GET /api/feedback/user/{user_id}
async fn user_feedback(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, AppError>,
) -> ApiResult<Page<FeedbackView>> {
    if !ctx.can_act_for(user_id) {
        return Err(AppError::AuthorizationError(
            "You can only view your own feedback".to_string(),
        ));
    }
    let page = query.validate()?;
    let feedback = state.feedback.feedback_by_user(user_id, page).await?;
    Ok(ApiResponse::ok(feedback.map(FeedbackView::from)))
}
