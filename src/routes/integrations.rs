// ABOUTME: Integration catalog, listing, and OAuth connect/callback route handlers
// ABOUTME: Callbacks exchange the grant, verify it where possible, and upsert credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! # Integration Routes
//!
//! The connect endpoint hands the frontend a provider authorization URL with
//! the signed-in user id as `state`. The callback endpoint is unauthenticated
//! because the browser arrives from the provider's consent screen; the user
//! id comes back in `state` instead.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::cache::Fingerprint;
use crate::constants::services;
use crate::errors::AppError;
use crate::server::ServerResources;

/// Query parameters delivered by the provider's consent redirect
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Integration routes implementation
pub struct IntegrationRoutes;

impl IntegrationRoutes {
    /// Create all integration routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/apps", get(Self::handle_catalog))
            .route("/integrations", get(Self::handle_list))
            .route("/integrations/:provider/connect", get(Self::handle_connect))
            .route(
                "/integrations/:provider/callback",
                get(Self::handle_callback),
            )
            .with_state(resources)
    }

    /// Catalog of connectable services, shown before sign-in
    async fn handle_catalog() -> Response {
        let integrations = json!([
            {
                "id": "github",
                "name": "GitHub",
                "description": "Connect to GitHub to track your repositories, issues, and pull requests.",
                "icon": "github",
                "connect_url": "/integrations/github/connect"
            },
            {
                "id": "google",
                "name": "Google",
                "description": "Connect to Google services for calendar, tasks, and emails.",
                "icon": "google",
                "connect_url": "/integrations/google/connect"
            },
            {
                "id": "jira",
                "name": "Jira",
                "description": "Connect to Jira for project management and issue tracking.",
                "icon": "jira",
                "connect_url": "/integrations/jira/connect"
            }
        ]);
        (
            StatusCode::OK,
            Json(json!({ "integrations": integrations })),
        )
            .into_response()
    }

    /// List the authenticated user's integrations, tokens omitted
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let integrations = resources.database.list_integrations(user.id).await?;
        Ok((StatusCode::OK, Json(integrations)).into_response())
    }

    /// Build the provider authorization URL for the signed-in user
    async fn handle_connect(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(provider): Path<String>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let oauth_provider = resources.oauth.resolve(&provider)?;
        // The user id rides through the provider as `state` so the callback
        // can attach tokens to the right account.
        let url = oauth_provider.authorize_url(&user.id.to_string())?;
        Ok((StatusCode::OK, Json(json!({ "url": url }))).into_response())
    }

    /// Complete the OAuth flow: exchange the grant, verify it, store tokens
    async fn handle_callback(
        State(resources): State<Arc<ServerResources>>,
        Path(provider): Path<String>,
        Query(params): Query<CallbackQuery>,
    ) -> Result<Response, AppError> {
        let code = params
            .code
            .ok_or_else(|| AppError::missing_field("Missing code parameter"))?;
        let state = params
            .state
            .ok_or_else(|| AppError::missing_field("Missing state parameter"))?;
        let user_id: i64 = state
            .parse()
            .map_err(|_| AppError::invalid_input("Invalid state parameter"))?;

        let oauth_provider = resources.oauth.resolve(&provider)?;
        let token = oauth_provider.exchange_code(&code).await.map_err(|e| {
            warn!(provider = provider.as_str(), "token exchange failed: {e}");
            AppError::invalid_input("Failed to get access token")
        })?;

        let body = Self::store_connection(&resources, &provider, user_id, &token).await?;

        // Fresh credentials can change what upstream returns, so cached
        // payloads for this service are dropped.
        let pattern = Fingerprint::service_pattern(user_id, &provider);
        if let Err(e) = resources.cache.invalidate_pattern(&pattern).await {
            warn!(pattern = pattern.as_str(), "cache invalidation failed: {e}");
        }

        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Verify the new token where the provider allows it and upsert the row.
    async fn store_connection(
        resources: &Arc<ServerResources>,
        provider: &str,
        user_id: i64,
        token: &crate::oauth::TokenData,
    ) -> Result<Value, AppError> {
        match provider {
            services::GITHUB => {
                let github_user = resources
                    .github
                    .authenticated_user(&token.access_token)
                    .await
                    .map_err(|e| {
                        warn!("github token verification failed: {e}");
                        AppError::invalid_input("Failed to get user info")
                    })?;
                resources
                    .database
                    .upsert_integration(user_id, provider, &token.access_token, None, None)
                    .await?;
                Ok(json!({
                    "success": true,
                    "integration": "github",
                    "username": github_user.login
                }))
            }
            services::GOOGLE => {
                let google_user = resources
                    .google
                    .user_info(&token.access_token)
                    .await
                    .map_err(|e| {
                        warn!("google token verification failed: {e}");
                        AppError::invalid_input("Failed to get user info")
                    })?;
                resources
                    .database
                    .upsert_integration(
                        user_id,
                        provider,
                        &token.access_token,
                        token.refresh_token.as_deref(),
                        token.expires_at,
                    )
                    .await?;
                Ok(json!({
                    "success": true,
                    "integration": "google",
                    "email": google_user.email
                }))
            }
            // Atlassian has no cheap identity endpoint on these scopes, so
            // the exchanged token is stored as-is.
            _ => {
                resources
                    .database
                    .upsert_integration(
                        user_id,
                        provider,
                        &token.access_token,
                        token.refresh_token.as_deref(),
                        token.expires_at,
                    )
                    .await?;
                Ok(json!({ "message": "Jira integration successful" }))
            }
        }
    }
}
