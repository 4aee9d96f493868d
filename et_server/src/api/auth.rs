//! Authentication API handlers.
//!
//! This module provides HTTP REST endpoints for:
//! - Player registration
//! - Login returning a bearer access token
//! - Reading the authenticated user
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "player1", "email": "player1@example.com", "password": "SecurePass123"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "player1", "password": "SecurePass123"}'
//!
//! curl -X POST http://localhost:8000/api/v1/auth/login \
//!   -d 'username=player1&password=SecurePass123'
//! ```

use axum::{Json, extract::Extension, extract::State, http::StatusCode};
use esports_tournaments::auth::{AccessToken, RegisterRequest, User};

use super::{
    AppState,
    errors::{ApiResult, auth_error},
    extract::{ApiJson, LoginCredentials},
    request_id::RequestId,
};
use crate::{logging, metrics};

/// Register a new player account.
///
/// # Request Body
///
/// ```json
/// {
///   "username": "player123",
///   "email": "player@example.com",
///   "password": "SecurePass123"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the new user. The role is always `player`.
///
/// # Errors
///
/// - `400 Bad Request`: Username or email taken, weak password, or invalid input
/// - `500 Internal Server Error`: Server error during registration
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .auth_manager
        .register(payload)
        .await
        .map_err(auth_error)?;

    metrics::registrations_total();
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticate a user and issue an access token.
///
/// Accepts a JSON body or an OAuth2 password form
/// (`username=...&password=...`, `application/x-www-form-urlencoded`).
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJhbGciOiJIUzI1NiIs...",
///   "token_type": "bearer",
///   "expires_in": 86400
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: "Incorrect username or password", whatever the cause
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    LoginCredentials(payload): LoginCredentials,
) -> ApiResult<Json<AccessToken>> {
    let username = payload.username.clone();

    match state.auth_manager.login(payload).await {
        Ok((_user, token)) => {
            metrics::login_attempts_total(true);
            Ok(Json(token))
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            if e.is_authentication_failure() {
                logging::log_security_event(
                    "failed_login",
                    None,
                    Some(request_id.as_str()),
                    &format!("Failed login for {username}"),
                );
            }
            Err(auth_error(e))
        }
    }
}

/// Return the authenticated user.
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
