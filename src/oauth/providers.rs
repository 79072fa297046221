// ABOUTME: OAuth provider implementations for GitHub, Google, and Jira
// ABOUTME: Authorization URL construction and authorization-code token exchange
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::config::OAuthProviderConfig;
use crate::constants::{oauth, services};

use super::{OAuthError, OAuthProvider, TokenData};

// Both halves of the client credential pair are required for any flow.
fn require_credentials<'a>(
    config: &'a OAuthProviderConfig,
    provider: &str,
) -> Result<(&'a str, &'a str), OAuthError> {
    match (config.client_id.as_deref(), config.client_secret.as_deref()) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
        _ => Err(OAuthError::NotConfigured(provider.to_owned())),
    }
}

/// GitHub OAuth provider
pub struct GithubOAuthProvider {
    http: reqwest::Client,
    config: OAuthProviderConfig,
}

/// GitHub token response format
#[derive(Debug, Deserialize)]
struct GithubTokenResponse {
    access_token: Option<String>,
    error_description: Option<String>,
}

impl GithubOAuthProvider {
    #[must_use]
    pub fn new(http: reqwest::Client, config: OAuthProviderConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl OAuthProvider for GithubOAuthProvider {
    fn name(&self) -> &'static str {
        services::GITHUB
    }

    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let (client_id, _) = require_credentials(&self.config, "GitHub")?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&scope={}&state={}",
            oauth::GITHUB_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(oauth::GITHUB_SCOPES),
            urlencoding::encode(state),
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenData, OAuthError> {
        let (client_id, client_secret) = require_credentials(&self.config, "GitHub")?;

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(oauth::GITHUB_TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let response_text = response
            .text()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let token_response: GithubTokenResponse = serde_json::from_str(&response_text)
            .map_err(|e| OAuthError::TokenExchangeFailed(format!("Parse error: {e}")))?;

        // GitHub reports bad codes with HTTP 200 and an error body, so the
        // access_token field is the success signal.
        let Some(access_token) = token_response.access_token else {
            return Err(OAuthError::TokenExchangeFailed(
                token_response
                    .error_description
                    .unwrap_or_else(|| "no access token in response".to_owned()),
            ));
        };

        // GitHub OAuth app tokens do not expire and have no refresh token.
        Ok(TokenData {
            access_token,
            refresh_token: None,
            expires_at: None,
        })
    }
}

/// Google OAuth provider
pub struct GoogleOAuthProvider {
    http: reqwest::Client,
    config: OAuthProviderConfig,
}

/// Google token response format
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl GoogleOAuthProvider {
    #[must_use]
    pub fn new(http: reqwest::Client, config: OAuthProviderConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthProvider {
    fn name(&self) -> &'static str {
        services::GOOGLE
    }

    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let (client_id, _) = require_credentials(&self.config, "Google")?;
        // prompt=consent forces re-consent so Google issues a refresh token.
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&include_granted_scopes=true&prompt=consent&state={}",
            oauth::GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(oauth::GOOGLE_SCOPES),
            urlencoding::encode(state),
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenData, OAuthError> {
        let (client_id, client_secret) = require_credentials(&self.config, "Google")?;

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(oauth::GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let response_text = response
            .text()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let token_response: GoogleTokenResponse = serde_json::from_str(&response_text)
            .map_err(|e| OAuthError::TokenExchangeFailed(format!("Parse error: {e}")))?;

        Ok(TokenData {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            expires_at: token_response
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

/// Jira (Atlassian) OAuth provider
pub struct JiraOAuthProvider {
    http: reqwest::Client,
    config: OAuthProviderConfig,
}

/// Atlassian token response format
#[derive(Debug, Deserialize)]
struct JiraTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl JiraOAuthProvider {
    #[must_use]
    pub fn new(http: reqwest::Client, config: OAuthProviderConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl OAuthProvider for JiraOAuthProvider {
    fn name(&self) -> &'static str {
        services::JIRA
    }

    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let (client_id, _) = require_credentials(&self.config, "Jira")?;
        Ok(format!(
            "{}?audience={}&client_id={}&scope={}&redirect_uri={}&response_type=code&state={}",
            oauth::JIRA_AUTH_URL,
            urlencoding::encode(oauth::JIRA_AUDIENCE),
            urlencoding::encode(client_id),
            urlencoding::encode(oauth::JIRA_SCOPES),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(state),
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenData, OAuthError> {
        let (client_id, client_secret) = require_credentials(&self.config, "Jira")?;

        // Atlassian takes the exchange as a JSON body, not a form.
        let body = serde_json::json!({
            "grant_type": "authorization_code",
            "client_id": client_id,
            "client_secret": client_secret,
            "code": code,
            "redirect_uri": self.config.redirect_uri,
        });

        let response = self
            .http
            .post(oauth::JIRA_TOKEN_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let response_text = response
            .text()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let token_response: JiraTokenResponse = serde_json::from_str(&response_text)
            .map_err(|e| OAuthError::TokenExchangeFailed(format!("Parse error: {e}")))?;

        Ok(TokenData {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            expires_at: Some(
                Utc::now() + Duration::seconds(token_response.expires_in.unwrap_or(3600)),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_config() -> OAuthProviderConfig {
        OAuthProviderConfig {
            client_id: Some("client-id".to_owned()),
            client_secret: Some("client-secret".to_owned()),
            redirect_uri: "http://localhost:8000/integrations/callback".to_owned(),
        }
    }

    #[test]
    fn github_authorize_url_carries_scopes_and_state() {
        let provider = GithubOAuthProvider::new(reqwest::Client::new(), provider_config());
        let url = provider.authorize_url("42").unwrap();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("scope=repo%2Cuser%3Aemail%2Cread%3Aorg%2Cnotifications"));
        assert!(url.ends_with("&state=42"));
    }

    #[test]
    fn google_authorize_url_requests_offline_access() {
        let provider = GoogleOAuthProvider::new(reqwest::Client::new(), provider_config());
        let url = provider.authorize_url("7").unwrap();

        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("include_granted_scopes=true"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn jira_authorize_url_pins_the_atlassian_audience() {
        let provider = JiraOAuthProvider::new(reqwest::Client::new(), provider_config());
        let url = provider.authorize_url("7").unwrap();

        assert!(url.starts_with("https://auth.atlassian.com/authorize?audience=api.atlassian.com"));
        assert!(url.contains("scope=read%3Ajira-user%20read%3Ajira-work%20write%3Ajira-work"));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let config = OAuthProviderConfig {
            client_id: Some("client-id".to_owned()),
            client_secret: None,
            redirect_uri: String::new(),
        };
        let provider = GoogleOAuthProvider::new(reqwest::Client::new(), config);

        let error = provider.authorize_url("1").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Google OAuth credentials not configured"
        );
    }
}
