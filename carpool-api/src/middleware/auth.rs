use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use carpool_core::identity::AuthContext;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthSettings};

// ============================================================================
// JWT Claims
// ============================================================================

/// Access-token claims issued by the identity provider. Only `email` is used
/// to resolve the caller; `sub` is the provider's own user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

pub fn verify_token(token: &str, settings: &AuthSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    match &settings.audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        AppError::AuthenticationError("Invalid or expired token".to_string())
    })
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Authorization(bearer) = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::AuthenticationError("Authentication required".to_string()))?;

    let claims = verify_token(bearer.token(), &state.auth)?;

    let user = state
        .users
        .find_by_email(&claims.email)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("User not found".to_string()))?;

    if user.role_status.is_some_and(|s| s.is_locked()) {
        tracing::warn!(user_id = %user.id, role_status = ?user.role_status, "Locked account refused");
        return Err(AppError::AuthorizationError(
            "Account is inactive or suspended".to_string(),
        ));
    }

    let ctx = AuthContext::from(&user);
    tracing::debug!(user_id = %ctx.user_id, role = %ctx.role, "Authenticated");
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Gate
// ============================================================================

pub fn ensure_admin(ctx: &AuthContext) -> Result<(), AppError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(AppError::AuthorizationError("Admin access required".to_string()))
    }
}

/// Must run inside `require_auth`.
pub async fn require_admin(
    Extension(ctx): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    ensure_admin(&ctx)?;
    Ok(next.run(req).await)
}
