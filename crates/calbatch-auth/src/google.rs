//! Google OAuth2 provider for Calendar access.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::oauth::{OAuth2Config, OAuth2Provider};
use crate::secrets::ClientSecrets;
use crate::storage::TokenSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
}

impl GoogleTokenResponse {
    /// Convert to a cacheable token set.
    ///
    /// Google usually omits the refresh token on refresh, so the previous one
    /// is kept when the response has none.
    pub fn into_token_set(self, previous_refresh_token: Option<String>) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            expires_at: chrono::Utc::now().timestamp() + self.expires_in as i64,
            scopes: self
                .scope
                .map(|s| s.split(' ').map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        }
    }
}

pub struct GoogleOAuth2Provider {
    config: OAuth2Config,
    http: reqwest::Client,
}

impl GoogleOAuth2Provider {
    pub fn new(secrets: &ClientSecrets, callback_port: u16, scopes: Vec<String>) -> Self {
        Self {
            config: OAuth2Config {
                client_id: secrets.client_id.clone(),
                client_secret: secrets.client_secret.clone(),
                auth_url: secrets.auth_uri.clone(),
                token_url: secrets.token_uri.clone(),
                callback_port,
                scopes,
            },
            http: reqwest::Client::new(),
        }
    }

    /// Refresh an expired access token.
    #[tracing::instrument(skip(self, refresh_token), level = "info")]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("Failed to send refresh request")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Token refresh failed: {}", error_text);
        }

        let tokens = response
            .json::<GoogleTokenResponse>()
            .await
            .context("Failed to parse refresh response")?;

        Ok(tokens.into_token_set(Some(refresh_token.to_string())))
    }
}

impl OAuth2Provider for GoogleOAuth2Provider {
    fn config(&self) -> &OAuth2Config {
        &self.config
    }

    // Without offline access + forced consent Google returns no refresh token.
    fn extra_auth_params(&self) -> Vec<(&'static str, &'static str)> {
        vec![("access_type", "offline"), ("prompt", "consent")]
    }
}
