// ABOUTME: HTTP server assembly: middleware stack, listener binding, graceful shutdown
// ABOUTME: Routes and shared resources come together here into the running axum service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

pub mod resources;

pub use resources::ServerResources;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use http::Method;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::constants::defaults;
use crate::errors::{AppError, AppResult};
use crate::routes;

/// Dashboard HTTP server
pub struct DashboardServer {
    resources: Arc<ServerResources>,
}

impl DashboardServer {
    #[must_use]
    pub fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Bind the configured port and serve until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails
    /// while running.
    pub async fn run(self) -> AppResult<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.resources.config.http_port));
        let app = Self::build_router(self.resources);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        info!("HTTP server listening on {addr}");

        tokio::select! {
            result = axum::serve(listener, app) => {
                result.map_err(|e| AppError::internal(format!("HTTP server error: {e}")))?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping HTTP server");
            }
        }

        Ok(())
    }

    /// Full application router including middleware, shared with tests.
    #[must_use]
    pub fn build_router(resources: Arc<ServerResources>) -> Router {
        // ServiceBuilder applies top-down: request ids are assigned before
        // tracing so every span carries one, and the timeout sits inside
        // tracing so timeouts are recorded.
        routes::router(resources).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    defaults::REQUEST_TIMEOUT_SECS,
                )))
                .layer(cors_layer()),
        )
    }
}

/// Permissive CORS for the dashboard frontend, which runs on its own origin.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
