//! Token acquisition for backend authentication
//!
//! The bridge never implements an authentication flow itself. Everything that
//! talks to a backend asks a [`TokenProvider`] for a bearer token and attaches
//! whatever comes back. Interactive flows (device code, client credentials)
//! live outside this process; the providers here cover static tokens,
//! environment variables, and the no-auth mock mode.

use crate::config::{AuthConfig, TokenSourceConfig};
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Supplies bearer tokens for backend requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token for the given scope, or None when requests must carry
    /// no Authorization header at all (no-auth mode)
    async fn get_token(&self, scope: Option<&str>) -> Result<Option<String>>;
}

/// No authentication: requests go out without an Authorization header
pub struct NoAuthTokenProvider;

#[async_trait]
impl TokenProvider for NoAuthTokenProvider {
    async fn get_token(&self, _scope: Option<&str>) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Fixed token taken from configuration
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, _scope: Option<&str>) -> Result<Option<String>> {
        if self.token.is_empty() {
            return Err(BridgeError::auth("Configured static token is empty"));
        }
        Ok(Some(self.token.clone()))
    }
}

/// Reads the token from an environment variable on every request, so a
/// rotated credential is picked up without restarting the bridge
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new<S: Into<String>>(var: S) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn get_token(&self, _scope: Option<&str>) -> Result<Option<String>> {
        match std::env::var(&self.var) {
            Ok(token) if !token.is_empty() => Ok(Some(token)),
            Ok(_) => Err(BridgeError::auth(format!(
                "Environment variable '{}' is set but empty",
                self.var
            ))),
            Err(_) => Err(BridgeError::auth(format!(
                "Environment variable '{}' is not set",
                self.var
            ))),
        }
    }
}

/// Build the provider selected by the auth configuration
pub fn provider_from_config(auth: Option<&AuthConfig>) -> Arc<dyn TokenProvider> {
    match auth.map(|a| &a.source) {
        None | Some(TokenSourceConfig::None) => Arc::new(NoAuthTokenProvider),
        Some(TokenSourceConfig::Static { token }) => {
            Arc::new(StaticTokenProvider::new(token.clone()))
        }
        Some(TokenSourceConfig::Env { var }) => Arc::new(EnvTokenProvider::new(var.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_auth_returns_none() {
        let provider = NoAuthTokenProvider;
        let token = provider.get_token(None).await.unwrap();
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticTokenProvider::new("abc123");
        let token = provider.get_token(Some("tools.read")).await.unwrap();
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_static_token_empty_is_error() {
        let provider = StaticTokenProvider::new("");
        assert!(provider.get_token(None).await.is_err());
    }

    #[tokio::test]
    async fn test_env_token_missing_var_is_error() {
        let provider = EnvTokenProvider::new("TOOLBRIDGE_TEST_TOKEN_DOES_NOT_EXIST");
        let err = provider.get_token(None).await.unwrap_err();
        assert_eq!(err.category(), "auth");
    }

    #[tokio::test]
    async fn test_provider_from_config_defaults_to_no_auth() {
        let provider = provider_from_config(None);
        assert!(provider.get_token(None).await.unwrap().is_none());
    }
}
