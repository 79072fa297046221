// ABOUTME: Centralized resource container for dependency injection across route handlers
// ABOUTME: Builds the shared HTTP client, capability registry, dispatcher, and services once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! # Server Resources
//!
//! All expensive shared state (database pool, cache backend, provider HTTP
//! client) is constructed once at startup and handed to every route via
//! `Arc<ServerResources>`. Handlers never build their own clients.

use std::sync::Arc;

use crate::cache::CacheProvider;
use crate::config::ServerConfig;
use crate::constants::USER_AGENT;
use crate::credentials::CredentialResolver;
use crate::database::Database;
use crate::errors::AppResult;
use crate::oauth::OAuthRegistry;
use crate::providers::{GithubClient, GoogleClient};
use crate::services::NotesService;
use crate::widgets::{CapabilityRegistry, DashboardAggregator, WidgetDispatcher};

/// Shared resources for all HTTP routes
#[derive(Clone)]
pub struct ServerResources {
    /// Validated server configuration
    pub config: Arc<ServerConfig>,
    /// Database connection pool
    pub database: Database,
    /// Response cache backend
    pub cache: Arc<dyn CacheProvider>,
    /// Active-integration lookups
    pub credentials: CredentialResolver,
    /// Widget capability registry
    pub registry: Arc<CapabilityRegistry>,
    /// Cache-aware widget dispatcher
    pub dispatcher: Arc<WidgetDispatcher>,
    /// Dashboard-wide aggregation orchestrator
    pub aggregator: Arc<DashboardAggregator>,
    /// OAuth provider registry for connect and callback flows
    pub oauth: Arc<OAuthRegistry>,
    /// Note CRUD with cached reads
    pub notes: NotesService,
    /// GitHub API client, used by callbacks to verify tokens
    pub github: GithubClient,
    /// Google API client, used by callbacks to verify tokens
    pub google: GoogleClient,
}

impl ServerResources {
    /// Wire up every shared resource from the validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client cannot be constructed.
    pub fn new(
        config: ServerConfig,
        database: Database,
        cache: Arc<dyn CacheProvider>,
    ) -> AppResult<Self> {
        // GitHub rejects requests without a User-Agent, so the shared client
        // carries one on every provider call.
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.aggregation.provider_timeout())
            .build()?;

        let ttl = config.cache.to_cache_config().ttl;
        let credentials = CredentialResolver::new(database.clone());
        let registry = Arc::new(CapabilityRegistry::standard(&http, &config.oauth));
        let dispatcher = Arc::new(WidgetDispatcher::new(
            cache.clone(),
            credentials.clone(),
            registry.clone(),
            ttl,
        ));
        let aggregator = Arc::new(DashboardAggregator::new(
            dispatcher.clone(),
            credentials.clone(),
            config.aggregation.deadline(),
        ));
        let oauth = Arc::new(OAuthRegistry::standard(&http, &config.oauth));
        let notes = NotesService::new(database.clone(), cache.clone(), ttl.notes);
        let github = GithubClient::new(http.clone());
        let google = GoogleClient::new(http, config.oauth.google.clone());

        Ok(Self {
            config: Arc::new(config),
            database,
            cache,
            credentials,
            registry,
            dispatcher,
            aggregator,
            oauth,
            notes,
            github,
            google,
        })
    }
}
