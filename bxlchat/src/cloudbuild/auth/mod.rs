//! Bearer-token acquisition for the CloudBuild service.
//!
//! [`BuildSubmitter`](crate::cloudbuild::BuildSubmitter) asks a [`TokenProvider`] for a token
//! once per submission. Production uses [`InteractiveBrowserTokenProvider`]; headless runs and
//! tests use [`StaticTokenProvider`].

mod interactive;

use async_trait::async_trait;
use thiserror::Error;

pub use interactive::InteractiveBrowserTokenProvider;

/// A bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The identity provider needs the user to sign in and that could not happen.
    #[error("interactive authentication is required")]
    InteractionRequired,
    #[error("{0}")]
    Failed(String),
}

/// Source of bearer tokens for a set of scopes.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError>;
}

/// Hands out a fixed token (e.g. from `CLOUDBUILD_ACCESS_TOKEN`).
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(secret),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self, _scopes: &[&str]) -> Result<AccessToken, AuthError> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        let s = format!("{:?}", token);
        assert!(!s.contains("super-secret"));
        assert_eq!(token.secret(), "super-secret");
    }

    #[tokio::test]
    async fn static_provider_returns_its_token() {
        let provider = StaticTokenProvider::new("t0k");
        let token = provider.access_token(&["scope"]).await.unwrap();
        assert_eq!(token.secret(), "t0k");
    }

    #[test]
    fn auth_error_failed_displays_message() {
        assert_eq!(AuthError::Failed("boom".into()).to_string(), "boom");
    }
}
