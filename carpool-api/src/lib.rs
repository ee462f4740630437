use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod bookings;
pub mod driver_applications;
pub mod error;
pub mod feedback;
pub mod middleware;
pub mod ratings;
pub mod response;
pub mod rides;
pub mod state;

pub use state::{AppState, AuthSettings};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // The admin gate reads the AuthContext that require_auth inserts.
    let admin_only = Router::new()
        .merge(admin::routes())
        .merge(driver_applications::routes())
        .merge(bookings::admin_routes())
        .merge(ratings::admin_routes())
        .merge(feedback::admin_routes())
        .route_layer(from_fn(middleware::require_admin));

    let authenticated = Router::new()
        .merge(rides::routes())
        .merge(bookings::routes())
        .merge(ratings::routes())
        .merge(feedback::routes())
        .merge(admin_only)
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .route("/health", get(health))
        .merge(authenticated)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}
