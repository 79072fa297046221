// ABOUTME: HTTP route modules and the shared request authentication helper
// ABOUTME: Each domain file owns its router; this module merges them into one app
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! # HTTP Routes
//!
//! Every route family lives in its own file and exposes a
//! `routes(Arc<ServerResources>)` constructor. Authentication is a gateway
//! concern: upstream middleware verifies the caller and forwards the user id
//! in the `x-user-id` header, which [`authenticate`] resolves to a [`User`].

/// Dashboard and widget CRUD plus the aggregate data endpoint
pub mod dashboards;
/// Liveness and dependency health reporting
pub mod health;
/// Connected-service catalog and OAuth connect/callback flows
pub mod integrations;
/// Personal note CRUD and search
pub mod notes;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::Router;

use crate::constants::USER_ID_HEADER;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::server::ServerResources;

/// Merge every route family into the application router.
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(health::HealthRoutes::routes(resources.clone()))
        .merge(dashboards::DashboardRoutes::routes(resources.clone()))
        .merge(integrations::IntegrationRoutes::routes(resources.clone()))
        .merge(notes::NotesRoutes::routes(resources))
}

/// Resolve the acting user from the gateway-supplied `x-user-id` header.
///
/// # Errors
///
/// Returns 401 when the header is missing, malformed, or names a user that
/// does not exist or is deactivated.
pub(crate) async fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<User> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(AppError::auth_required)?;

    let user_id: i64 = raw
        .parse()
        .map_err(|_| AppError::auth_invalid(format!("Invalid {USER_ID_HEADER} header")))?;

    let user = resources
        .database
        .get_user(user_id)
        .await
        .map_err(|e| AppError::database(format!("Failed to load user {user_id}: {e}")))?
        .ok_or_else(|| AppError::auth_invalid("Unknown user"))?;

    if !user.is_active {
        return Err(AppError::auth_invalid("User account is deactivated"));
    }

    Ok(user)
}
