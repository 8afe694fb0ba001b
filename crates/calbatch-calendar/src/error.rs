//! Calendar-specific error types.

use calbatch_core::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Access denied (403): {0}")]
    AuthRequired(String),

    #[error("Token expired or revoked (401)")]
    TokenExpired,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Not found (404): {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl CalendarError {
    /// Whether deleting the token cache and signing in again may help.
    pub fn should_reauthorize(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::AuthRequired(_))
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        if err.should_reauthorize() {
            tracing::info!("Delete the token cache file to sign in again");
        }
        AppError::remote(err)
    }
}
