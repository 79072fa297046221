// ABOUTME: Dashboard and widget route handlers including the aggregate data endpoint
// ABOUTME: Widget reads fan out through the dispatcher so cached payloads are shared
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! # Dashboard Routes
//!
//! Dashboard CRUD plus the two data planes: per-dashboard widget hydration
//! (`GET /dashboards/:id`) and the cross-service aggregate
//! (`GET /dashboard/data`). Both go through the [`WidgetDispatcher`] so a
//! payload fetched for one surface serves the other from cache.
//!
//! [`WidgetDispatcher`]: crate::widgets::WidgetDispatcher

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::future::join_all;

use crate::errors::AppError;
use crate::models::{DashboardCreate, DashboardWithData, WidgetCreate, WidgetWithData};
use crate::server::ServerResources;
use crate::widgets::WidgetRequest;

/// Dashboard routes implementation
pub struct DashboardRoutes;

impl DashboardRoutes {
    /// Create all dashboard routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/dashboards", get(Self::handle_list))
            .route("/dashboards", post(Self::handle_create))
            .route("/dashboards/:dashboard_id", get(Self::handle_get))
            .route(
                "/dashboards/:dashboard_id/widgets/integration",
                post(Self::handle_create_widget),
            )
            .route("/dashboard/data", get(Self::handle_aggregate))
            .with_state(resources)
    }

    /// List the authenticated user's dashboards
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let dashboards = resources.database.list_dashboards(user.id).await?;
        Ok((StatusCode::OK, Json(dashboards)).into_response())
    }

    /// Create a dashboard
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(payload): Json<DashboardCreate>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let dashboard = resources.database.create_dashboard(user.id, &payload).await?;
        Ok((StatusCode::OK, Json(dashboard)).into_response())
    }

    /// Fetch one dashboard with live (or cached) data for each active widget
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(dashboard_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let dashboard = resources
            .database
            .get_dashboard(user.id, dashboard_id)
            .await?
            .ok_or_else(|| AppError::not_found("Dashboard"))?;

        let widgets = resources.database.list_active_widgets(dashboard.id).await?;

        // All widgets hydrate concurrently; the dispatcher turns upstream
        // failures into error payloads, so one bad widget cannot fail the
        // dashboard.
        let requests: Vec<WidgetRequest> = widgets
            .iter()
            .map(|widget| WidgetRequest::from_widget(user.id, widget))
            .collect();
        let payloads = join_all(
            requests
                .iter()
                .map(|request| resources.dispatcher.widget_data(request)),
        )
        .await;

        let widgets = widgets
            .into_iter()
            .zip(payloads)
            .map(|(widget, data)| WidgetWithData { widget, data })
            .collect();

        let response = DashboardWithData { dashboard, widgets };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Add an integration-backed widget to a dashboard
    async fn handle_create_widget(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(dashboard_id): Path<i64>,
        Json(payload): Json<WidgetCreate>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let dashboard = resources
            .database
            .get_dashboard(user.id, dashboard_id)
            .await?
            .ok_or_else(|| AppError::not_found("Dashboard"))?;

        // Widgets are rejected up front when the service is not connected,
        // instead of rendering a permanent error tile.
        let integration = resources
            .credentials
            .active(user.id, &payload.service_name)
            .await?;
        if integration.is_none() {
            return Err(AppError::invalid_input(format!(
                "No active {} integration found. Please connect the service first.",
                payload.service_name
            )));
        }

        let widget = resources
            .database
            .create_widget(dashboard.id, &payload)
            .await?;
        Ok((StatusCode::OK, Json(widget)).into_response())
    }

    /// Aggregate widget data across every connected service
    async fn handle_aggregate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let data = resources.aggregator.aggregate(user.id).await?;
        Ok((StatusCode::OK, Json(data)).into_response())
    }
}
