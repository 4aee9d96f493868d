//! Mapping from domain errors to HTTP responses.
//!
//! Every error leaves the server as `{"error": "<message>"}` with a status
//! chosen by error kind. Database details never reach the client.

use axum::{Json, http::StatusCode};
use esports_tournaments::{auth::AuthError, tournament::TournamentError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<T, ApiError>;

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn tournament_status(err: &TournamentError) -> StatusCode {
    match err {
        TournamentError::NotFound(_) => StatusCode::NOT_FOUND,
        TournamentError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        TournamentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TournamentError::Persistence(_) => StatusCode::BAD_REQUEST,
        TournamentError::VersionConflict { .. } => StatusCode::CONFLICT,
        TournamentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::JwtError(_) | AuthError::InvalidToken => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::UsernameTaken
        | AuthError::EmailTaken
        | AuthError::InvalidUsername(_)
        | AuthError::InvalidEmail(_)
        | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
        AuthError::Database(_) | AuthError::HashingFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TournamentError> for ErrorResponse {
    fn from(err: TournamentError) -> Self {
        Self {
            error: err.client_message(),
        }
    }
}

pub fn tournament_error(err: TournamentError) -> ApiError {
    let status = tournament_status(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Tournament operation failed: {}", err);
    }
    (status, Json(err.into()))
}

pub fn auth_error(err: AuthError) -> ApiError {
    let status = auth_status(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Authentication failed internally: {}", err);
    }
    error_response(status, err.client_message())
}
