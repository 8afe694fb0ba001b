//! Centralized error types for calbatch.
//!
//! This module provides a typed error hierarchy that:
//! - Separates authentication, selection and remote service failures
//! - Provides short user-facing messages for the terminal
//! - Preserves full error context for logging

use thiserror::Error;

/// Top-level application error type.
///
/// Everything the dispatcher can fail with converts into this type.
/// Use `user_message()` for the one-line hint printed after the error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Selection(#[from] SelectionError),

    /// Any failure surfaced by the calendar provider during list/get/delete/insert.
    #[error("Calendar service error: {0}")]
    Remote(String),

    /// Batch ran to completion under the `continue` policy but some items failed.
    #[error("{failed} of {total} operations failed")]
    Batch { failed: usize, total: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap a provider error.
    pub fn remote(err: impl std::fmt::Display) -> Self {
        Self::Remote(err.to_string())
    }

    /// Returns a short message suitable for the terminal.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Selection(e) => e.user_message(),
            AppError::Remote(_) => "The calendar service rejected the request. Nothing further was attempted.",
            AppError::Batch { .. } => "Some operations failed. See the log output above.",
            AppError::Io(_) => "Writing output failed.",
            AppError::Other(_) => "An unexpected error occurred.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Failed to write configuration: {0}")]
    WriteFailed(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration file not found. Check the --config path.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::WriteFailed(_) => "Could not write the default configuration file.",
        }
    }
}

/// Authentication errors (client secrets, token cache, OAuth flow).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Client secrets file not found: {0}")]
    CredentialsNotFound(String),

    #[error("Invalid client secrets: {0}")]
    InvalidCredentials(String),

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Token cache error: {0}")]
    StorageError(String),

    #[error("Port {0} already in use for OAuth callback")]
    PortInUse(u16),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::CredentialsNotFound(_) => {
                "Provide OAuth client credentials (download credentials.json from the Google Cloud console)."
            }
            AuthError::InvalidCredentials(_) => "The client secrets file is not a Google OAuth client file.",
            AuthError::OAuthFailed(_) => "Sign-in failed. Please try again.",
            AuthError::RefreshFailed(_) => "Your session could not be renewed. Please sign in again.",
            AuthError::StorageError(_) => "Failed to read or write the token cache file.",
            AuthError::PortInUse(_) => "Sign-in port is busy. Change auth.callback_port and try again.",
        }
    }
}

/// A selector that had to resolve to exactly one item did not.
///
/// Carries every candidate (`"<name>: <id>"`) so the caller can print the
/// list and let the user narrow the selector instead of guessing.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("No {kind} matches \"{selector}\"")]
    NotFound {
        kind: &'static str,
        selector: String,
        candidates: Vec<String>,
    },

    #[error("{count} {kind}s match \"{selector}\"", count = .candidates.len())]
    Ambiguous {
        kind: &'static str,
        selector: String,
        candidates: Vec<String>,
    },
}

impl SelectionError {
    pub fn candidates(&self) -> &[String] {
        match self {
            SelectionError::NotFound { candidates, .. }
            | SelectionError::Ambiguous { candidates, .. } => candidates,
        }
    }

    /// Numbered candidate listing, one per line starting at 1.
    pub fn candidate_listing(&self) -> String {
        self.candidates()
            .iter()
            .enumerate()
            .map(|(n, c)| format!("{}. {}", n + 1, c))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            SelectionError::NotFound { .. } => "Nothing matched. Pick one of the candidates above.",
            SelectionError::Ambiguous { .. } => {
                "More than one item matched. Use a longer name or the exact id."
            }
        }
    }
}
