use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// Token set for OAuth2 authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: String,

    /// Optional refresh token for token renewal
    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,

    /// Scopes granted to this token
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Check if the token needs refresh (within 5 minutes of expiry)
    pub fn needs_refresh(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at - 300 // 5 minute buffer
    }
}

/// File-backed token cache (`auth_token.json` by default).
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached token set. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<TokenSet>> {
        if !self.path.exists() {
            tracing::debug!("No token cache at {}", self.path.display());
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).context("Failed to read token cache")?;

        let token_set: TokenSet =
            serde_json::from_str(&json).context("Failed to deserialize token cache")?;

        tracing::debug!("Loaded cached token from {}", self.path.display());
        Ok(Some(token_set))
    }

    /// Write the token set, replacing any previous cache.
    ///
    /// On unix the file is readable by its owner only.
    pub fn store(&self, token_set: &TokenSet) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create token cache directory")?;
        }

        let json =
            serde_json::to_string_pretty(token_set).context("Failed to serialize token set")?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .context("Failed to open token cache")?;
        // An existing cache keeps its old mode through open().
        #[cfg(unix)]
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .context("Failed to restrict token cache permissions")?;
        file.write_all(json.as_bytes())
            .context("Failed to write token cache")?;

        tracing::info!("Stored token at {}", self.path.display());
        Ok(())
    }

    /// Remove the cache file if present
    pub fn delete(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to delete token cache")?;
            tracing::info!("Deleted token cache {}", self.path.display());
        }

        Ok(())
    }
}
