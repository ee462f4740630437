use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use carpool_core::identity::AuthContext;
use carpool_core::query::{Page, UserQuery};
use carpool_core::repository::DashboardStats;
use carpool_core::user::{RoleStatus, User, UserUpdate};
use uuid::Uuid;

use crate::error::AppError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/profile", get(profile))
        .route("/api/admin/users", get(list_users))
        .route(
            "/api/admin/users/{id}",
            get(get_user).patch(update_user).delete(deactivate_user),
        )
}

/// GET /api/admin/stats
async fn stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    Ok(ApiResponse::ok(state.users.dashboard_stats().await?))
}

/// GET /api/admin/profile
async fn profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<User> {
    Ok(ApiResponse::ok(state.users.get_user(ctx.user_id).await?))
}

/// GET /api/admin/users
async fn list_users(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UserQuery>, AppError>,
) -> ApiResult<Page<User>> {
    let filter = query.validate()?;
    Ok(ApiResponse::ok(state.users.list_users(&filter).await?))
}

/// GET /api/admin/users/{id}
async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> ApiResult<User> {
    Ok(ApiResponse::ok(state.users.get_user(id).await?))
}

/// PATCH /api/admin/users/{id}
async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(update), _): WithRejection<Json<UserUpdate>, AppError>,
) -> ApiResult<User> {
    let update = update.validate()?;
    let user = state.users.update_user(id, &update).await?;
    tracing::info!(user_id = %id, by = %ctx.user_id, "User updated by admin");
    Ok(ApiResponse::with_message("User updated successfully", user))
}

/// DELETE /api/admin/users/{id}
///
/// Soft delete: the account is marked inactive and can no longer authenticate.
async fn deactivate_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> ApiResult<User> {
    let user = state.users.set_role_status(id, RoleStatus::Inactive).await?;
    tracing::info!(user_id = %id, by = %ctx.user_id, "User deactivated");
    Ok(ApiResponse::with_message("User deactivated", user))
}
