// ABOUTME: Health check route reporting service liveness and dependency status
// ABOUTME: Checks the database pool and cache backend without failing the endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::server::ServerResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    /// Always answers 200 so load balancers keep polling; dependency
    /// failures show up in the body instead.
    async fn handle_health(State(resources): State<Arc<ServerResources>>) -> Response {
        let database = match resources.database.health_check().await {
            Ok(()) => json!({ "status": "ok" }),
            Err(e) => json!({ "status": "error", "message": e.to_string() }),
        };

        let cache = match resources.cache.health_check().await {
            Ok(()) => match resources.cache.stats().await {
                Ok(stats) => json!({ "status": "ok", "stats": stats }),
                Err(e) => json!({ "status": "ok", "message": e.to_string() }),
            },
            Err(e) => json!({ "status": "error", "message": e.to_string() }),
        };

        let body = json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "database": database,
            "cache": cache,
        });

        (StatusCode::OK, Json(body)).into_response()
    }
}
