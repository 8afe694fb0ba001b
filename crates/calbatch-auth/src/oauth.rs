use anyhow::{Context, Result};
use calbatch_core::AuthError;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use warp::Filter;

use crate::storage::TokenSet;

/// OAuth2 configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Client ID from OAuth provider
    pub client_id: String,

    /// Client secret from OAuth provider
    pub client_secret: String,

    /// Authorization endpoint URL
    pub auth_url: String,

    /// Token endpoint URL
    pub token_url: String,

    /// Loopback port the redirect listener binds to
    pub callback_port: u16,

    /// Scopes to request
    pub scopes: Vec<String>,
}

impl OAuth2Config {
    /// Redirect URI for the loopback listener
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/", self.callback_port)
    }
}

/// Authorization URL plus the secrets needed to finish the flow.
pub struct PendingAuthorization {
    pub url: String,
    pub csrf_token: CsrfToken,
    pub pkce_verifier: PkceCodeVerifier,
}

type CallbackResult = std::result::Result<(String, String), String>;
type CallbackSender = Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>;

/// OAuth2 provider trait
#[allow(async_fn_in_trait)]
pub trait OAuth2Provider: Send + Sync {
    /// Get the OAuth2 configuration
    fn config(&self) -> &OAuth2Config;

    /// Provider-specific query parameters added to the authorization URL
    fn extra_auth_params(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }

    fn client(&self) -> Result<BasicClient> {
        let config = self.config();

        Ok(BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone()).context("Invalid auth URL")?,
            Some(TokenUrl::new(config.token_url.clone()).context("Invalid token URL")?),
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_uri()).context("Invalid redirect URI")?,
        ))
    }

    /// Build the authorization URL with PKCE and a CSRF token
    fn authorize(&self) -> Result<PendingAuthorization> {
        let client = self.client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client.authorize_url(CsrfToken::new_random);

        for scope in &self.config().scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }
        for (name, value) in self.extra_auth_params() {
            auth_request = auth_request.add_extra_param(name, value);
        }

        let (auth_url, csrf_token) = auth_request.set_pkce_challenge(pkce_challenge).url();

        Ok(PendingAuthorization {
            url: auth_url.to_string(),
            csrf_token,
            pkce_verifier,
        })
    }

    /// Complete the OAuth2 flow with the authorization code
    async fn exchange_code(&self, code: String, pkce_verifier: PkceCodeVerifier) -> Result<TokenSet> {
        let client = self.client()?;

        let token_result = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .context("Failed to exchange authorization code")?;

        let expires_in = token_result
            .expires_in()
            .map(|d| d.as_secs() as i64)
            .unwrap_or(3600);
        let expires_at = chrono::Utc::now().timestamp() + expires_in;

        let scopes = token_result
            .scopes()
            .map(|s| s.iter().map(|scope| scope.to_string()).collect())
            .unwrap_or_else(|| self.config().scopes.clone());

        Ok(TokenSet {
            access_token: token_result.access_token().secret().clone(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().clone()),
            expires_at,
            scopes,
        })
    }

    /// Interactive flow: open the browser, wait for the loopback redirect,
    /// exchange the code.
    async fn authenticate(&self) -> std::result::Result<TokenSet, AuthError> {
        let port = self.config().callback_port;
        let pending = self
            .authorize()
            .map_err(|e| AuthError::OAuthFailed(e.to_string()))?;

        let (tx, rx) = oneshot::channel::<CallbackResult>();
        let tx: CallbackSender = Arc::new(Mutex::new(Some(tx)));

        let routes = warp::get()
            .and(warp::path::end())
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::any().map(move || tx.clone()))
            .and_then(handle_callback);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(([127, 0, 0, 1], port), async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|_| AuthError::PortInUse(port))?;
        tokio::spawn(server);
        tracing::debug!("OAuth callback listener on {}", addr);

        match webbrowser::open(&pending.url) {
            Ok(()) => eprintln!("Your browser has been opened to visit:\n\n    {}\n", pending.url),
            Err(e) => {
                tracing::warn!("Failed to open browser: {}", e);
                eprintln!("Open this link in your browser to continue:\n\n    {}\n", pending.url);
            }
        }

        let callback = rx
            .await
            .map_err(|_| AuthError::OAuthFailed("callback listener closed".to_string()));
        let _ = shutdown_tx.send(());

        let (code, state) = callback?.map_err(AuthError::OAuthFailed)?;

        if state != *pending.csrf_token.secret() {
            return Err(AuthError::OAuthFailed("CSRF token mismatch".to_string()));
        }

        let token_set = self
            .exchange_code(code, pending.pkce_verifier)
            .await
            .map_err(|e| AuthError::OAuthFailed(format!("{:#}", e)))?;

        tracing::info!("OAuth2 flow completed");
        Ok(token_set)
    }
}

async fn handle_callback(
    params: HashMap<String, String>,
    tx: CallbackSender,
) -> std::result::Result<impl warp::Reply, warp::Rejection> {
    let result = match (params.get("code"), params.get("error")) {
        (_, Some(error)) => Err(format!("authorization denied: {}", error)),
        (Some(code), None) => Ok((
            code.clone(),
            params.get("state").cloned().unwrap_or_default(),
        )),
        (None, None) => Err("callback without an authorization code".to_string()),
    };

    let page = if result.is_ok() {
        "<html><body><h1>Authorization successful!</h1><p>You can close this window and return to the terminal.</p></body></html>"
    } else {
        "<html><body><h1>Authorization failed</h1><p>Return to the terminal for details.</p></body></html>"
    };

    if let Some(sender) = tx.lock().await.take() {
        let _ = sender.send(result);
    }

    Ok(warp::reply::html(page))
}
