// ABOUTME: OAuth module organizing the connect/callback flows for external services
// ABOUTME: Provider trait, token data, module error type, and the provider registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! OAuth plumbing
//!
//! Each connectable service implements [`OAuthProvider`]: building the
//! authorization URL a user is redirected to, and exchanging the callback
//! code for tokens. The `state` parameter round-trips the initiating user
//! id through the provider.

pub mod providers;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::errors::AppError;

/// Tokens returned by a completed code exchange
#[derive(Debug, Clone)]
pub struct TokenData {
    pub access_token: String,
    /// Absent for providers that issue non-expiring tokens
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// OAuth flow failures
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    #[error("{0} OAuth credentials not configured")]
    NotConfigured(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),
}

impl From<OAuthError> for AppError {
    fn from(error: OAuthError) -> Self {
        match error {
            OAuthError::UnsupportedProvider(name) => {
                Self::not_found(format!("OAuth provider {name}"))
            }
            OAuthError::NotConfigured(_) => Self::config(error.to_string()),
            OAuthError::TokenExchangeFailed(_) => Self::invalid_input(error.to_string()),
        }
    }
}

/// One connectable service's OAuth flow
#[async_trait::async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Service name as stored on integration rows
    fn name(&self) -> &'static str;

    /// Authorization URL the user is redirected to.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's client credentials are not
    /// configured.
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Exchange a callback code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not configured, the exchange
    /// request fails, or the response carries no access token.
    async fn exchange_code(&self, code: &str) -> Result<TokenData, OAuthError>;
}

/// Registry of OAuth providers keyed by service name
#[derive(Default)]
pub struct OAuthRegistry {
    providers: HashMap<String, Box<dyn OAuthProvider>>,
}

impl OAuthRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry wired with the GitHub, Google, and Jira flows
    #[must_use]
    pub fn standard(http: &reqwest::Client, config: &crate::config::OAuthConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(providers::GithubOAuthProvider::new(
            http.clone(),
            config.github.clone(),
        )));
        registry.register(Box::new(providers::GoogleOAuthProvider::new(
            http.clone(),
            config.google.clone(),
        )));
        registry.register(Box::new(providers::JiraOAuthProvider::new(
            http.clone(),
            config.jira.clone(),
        )));
        registry
    }

    /// Register a provider under its own name
    pub fn register(&mut self, provider: Box<dyn OAuthProvider>) {
        self.providers.insert(provider.name().to_owned(), provider);
    }

    /// Look up a provider by service name.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::UnsupportedProvider`] for unknown names.
    pub fn resolve(&self, name: &str) -> Result<&dyn OAuthProvider, OAuthError> {
        self.providers
            .get(name)
            .map(std::convert::AsRef::as_ref)
            .ok_or_else(|| OAuthError::UnsupportedProvider(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OAuthConfig, OAuthProviderConfig};

    fn empty_provider_config() -> OAuthProviderConfig {
        OAuthProviderConfig {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://localhost:8000/cb".to_owned(),
        }
    }

    #[test]
    fn standard_registry_resolves_every_connectable_service() {
        let config = OAuthConfig {
            github: empty_provider_config(),
            google: empty_provider_config(),
            jira: empty_provider_config(),
        };
        let registry = OAuthRegistry::standard(&reqwest::Client::new(), &config);

        for name in crate::constants::services::CONNECTABLE {
            let provider = registry.resolve(name);
            assert!(provider.is_ok(), "missing OAuth provider {name}");
            assert_eq!(provider.unwrap().name(), *name);
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let registry = OAuthRegistry::new();
        let error = registry.resolve("linear").err().unwrap();
        assert!(matches!(error, OAuthError::UnsupportedProvider(_)));
    }
}
