// ABOUTME: Main library entry point for the Synq dashboard aggregation server
// ABOUTME: Exposes the cache, widget dispatch, and HTTP route modules to binaries and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

#![deny(unsafe_code)]

//! # Synq Server
//!
//! A personal dashboard backend that aggregates widget data from connected
//! services (GitHub, Google, Jira) behind a response cache, so repeated
//! widget reads within a TTL window never touch the upstream APIs.
//!
//! ## Features
//!
//! - **Response caching**: Widget payloads are keyed by a deterministic
//!   fingerprint of user, service, widget kind, and configuration
//! - **Pluggable cache backends**: In-memory LRU by default, Redis when
//!   `REDIS_URL` is set, with fail-open fallback
//! - **Widget dispatch**: One cache-or-fetch path shared by dashboard
//!   hydration and the cross-service aggregate endpoint
//! - **OAuth connect flows**: Per-provider authorization and token exchange
//!   with upserted credentials
//!
//! ## Quick Start
//!
//! 1. Export provider OAuth credentials (`GITHUB_CLIENT_ID`, ...)
//! 2. Start the server with `synq-server`
//! 3. Point the dashboard frontend at `http://localhost:8000`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use synq_server::config::environment::ServerConfig;
//! use synq_server::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Synq server configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Response cache: fingerprints, backends, and the factory
pub mod cache;

/// Configuration management from environment variables
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Active-integration credential resolution
pub mod credentials;

/// `SQLite` persistence for users, integrations, dashboards, and notes
pub mod database;

/// Error types and HTTP error mapping
pub mod errors;

/// Structured logging initialization
pub mod logging;

/// Common data structures shared by storage and routes
pub mod models;

/// OAuth provider registry and token exchange flows
pub mod oauth;

/// Upstream API clients for connected services
pub mod providers;

/// HTTP route handlers
pub mod routes;

/// Server assembly and shared resources
pub mod server;

/// Business logic services behind the routes
pub mod services;

/// Widget capability registry, dispatcher, and aggregate orchestrator
pub mod widgets;
