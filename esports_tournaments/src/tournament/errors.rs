//! Tournament error types.

use thiserror::Error;

use super::{models::TournamentId, policy::AccessDenied, validation::ValidationError};

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Permission denied: {0}")]
    PermissionDenied(#[from] AccessDenied),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Tournament was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict { expected: i32, actual: i32 },

    /// A write failed and was rolled back
    #[error("Failed to save tournament: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TournamentError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) => "Internal server error".to_string(),
            TournamentError::Persistence(_) => "Failed to save tournament".to_string(),
            TournamentError::NotFound(_) => "Tournament not found".to_string(),
            _ => self.to_string(),
        }
    }

    /// Rejected input or a failed write, as opposed to a missing record or denied access
    pub fn is_validation_class(&self) -> bool {
        matches!(
            self,
            TournamentError::Validation(_) | TournamentError::Persistence(_)
        )
    }

    /// Convert storage failures raised during a write into `Persistence`
    pub(crate) fn into_write_failure(self) -> Self {
        match self {
            TournamentError::Database(e) => TournamentError::Persistence(e.to_string()),
            other => other,
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;
