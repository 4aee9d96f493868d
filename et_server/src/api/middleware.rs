//! Authentication middleware for protected endpoints.
//!
//! The middleware extracts the JWT access token from the Authorization header,
//! resolves it to an active user and injects both the [`User`] and the
//! [`Actor`] into request extensions for downstream handlers.
//!
//! # Extracting the Actor
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use esports_tournaments::auth::Actor;
//!
//! async fn protected_handler(Extension(actor): Extension<Actor>) -> String {
//!     format!("Authenticated as user {} ({})", actor.id, actor.role)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use esports_tournaments::auth::{Actor, User};

use super::{
    AppState,
    errors::{ApiError, error_response},
};

/// Pull the token out of an `Authorization: Bearer <token>` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authentication middleware that validates JWT tokens and injects the caller.
///
/// # Behavior
///
/// - **Success**: Token valid and user active → Injects `User` and `Actor` → Calls next handler
/// - **Missing header**: Returns `401 Unauthorized`
/// - **Invalid format**: Returns `401 Unauthorized`
/// - **Invalid/expired token or deactivated user**: Returns `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    let user: User = state
        .auth_manager
        .current_user(token)
        .await
        .map_err(|e| {
            if e.is_authentication_failure() {
                tracing::debug!("Rejected bearer token: {}", e);
                error_response(StatusCode::UNAUTHORIZED, "Could not validate credentials")
            } else {
                super::errors::auth_error(e)
            }
        })?;

    request.extensions_mut().insert(Actor::from(&user));
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
