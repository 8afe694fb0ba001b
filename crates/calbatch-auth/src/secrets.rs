//! Google OAuth client secrets file (`credentials.json`).
//!
//! The file is downloaded from the Google Cloud console and wraps the
//! client under either an `installed` (desktop) or `web` key.

use std::path::Path;

use calbatch_core::AuthError;
use serde::Deserialize;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

/// OAuth client registration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl ClientSecrets {
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::CredentialsNotFound(path.display().to_string()));
        }

        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::InvalidCredentials(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidCredentials("expected an \"installed\" or \"web\" client".to_string())
        })
    }
}
