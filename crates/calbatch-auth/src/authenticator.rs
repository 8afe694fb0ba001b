//! Credential provider: hands out a usable access token.
//!
//! Order of attempts: cached token, refresh with the cached refresh token,
//! interactive browser authorization. Whatever succeeds is written back to
//! the token cache.

use std::path::PathBuf;

use calbatch_core::{AuthConfig, AuthError};

use crate::google::GoogleOAuth2Provider;
use crate::oauth::OAuth2Provider;
use crate::secrets::ClientSecrets;
use crate::storage::{TokenSet, TokenStore};

pub struct Authenticator {
    store: TokenStore,
    credentials_file: PathBuf,
    callback_port: u16,
    scopes: Vec<String>,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            store: TokenStore::new(config.token_cache_file.clone()),
            credentials_file: config.credentials_file.clone(),
            callback_port: config.callback_port,
            scopes: config.scopes.clone(),
        }
    }

    /// Client secrets are only read when a refresh or authorization is needed.
    fn provider(&self) -> Result<GoogleOAuth2Provider, AuthError> {
        let secrets = ClientSecrets::from_file(&self.credentials_file)?;
        Ok(GoogleOAuth2Provider::new(
            &secrets,
            self.callback_port,
            self.scopes.clone(),
        ))
    }

    /// Return a cached token if still fresh, refreshing silently when possible.
    ///
    /// `Ok(None)` means the user has to authorize interactively.
    pub async fn cached_access_token(&self) -> Result<Option<String>, AuthError> {
        let cached = match self.store.load() {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Discarding unreadable token cache: {:#}", e);
                self.store
                    .delete()
                    .map_err(|e| AuthError::StorageError(format!("{:#}", e)))?;
                None
            }
        };

        let Some(token_set) = cached else {
            return Ok(None);
        };

        if !token_set.needs_refresh() {
            tracing::debug!("Using cached access token");
            return Ok(Some(token_set.access_token));
        }

        let Some(refresh_token) = token_set.refresh_token.as_deref() else {
            tracing::info!("Cached token expired and has no refresh token");
            return Ok(None);
        };

        match self.provider()?.refresh_token(refresh_token).await {
            Ok(refreshed) => {
                self.persist(&refreshed)?;
                Ok(Some(refreshed.access_token))
            }
            Err(e) => {
                tracing::warn!("{}", AuthError::RefreshFailed(format!("{:#}", e)));
                Ok(None)
            }
        }
    }

    /// Get an access token, running the browser flow when nothing cached works.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached_access_token().await? {
            return Ok(token);
        }

        let token_set = self.provider()?.authenticate().await?;
        self.persist(&token_set)?;
        Ok(token_set.access_token)
    }

    fn persist(&self, token_set: &TokenSet) -> Result<(), AuthError> {
        self.store
            .store(token_set)
            .map_err(|e| AuthError::StorageError(format!("{:#}", e)))
    }
}
