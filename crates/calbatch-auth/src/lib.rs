//! OAuth2 credential handling for calbatch.
//!
//! Reads Google client secrets, caches tokens on disk and runs the
//! installed-app browser flow when no usable token is cached.

pub mod authenticator;
pub mod google;
pub mod oauth;
pub mod secrets;
pub mod storage;

pub use authenticator::Authenticator;
pub use google::{GoogleOAuth2Provider, GoogleTokenResponse};
pub use oauth::{OAuth2Config, OAuth2Provider, PendingAuthorization};
pub use secrets::ClientSecrets;
pub use storage::{TokenSet, TokenStore};
