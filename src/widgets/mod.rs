// ABOUTME: Widget data plane shared types: capability trait, fetch parameters, dispatch requests
// ABOUTME: Submodules hold the capability registry, the dispatcher, and the aggregate orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! Widget data plane
//!
//! A widget names a `(service_name, widget_type)` pair plus an optional JSON
//! configuration map. The [`CapabilityRegistry`] resolves the pair to a
//! [`WidgetCapability`], and the [`WidgetDispatcher`] wraps each fetch in
//! cache lookups and credential resolution so callers always receive a
//! well-formed payload. [`DashboardAggregator`] fans the same dispatch out
//! across every connected service for the consolidated dashboard view.

pub mod aggregator;
pub mod dispatcher;
pub mod registry;

pub use aggregator::DashboardAggregator;
pub use dispatcher::WidgetDispatcher;
pub use registry::CapabilityRegistry;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::constants::limits;
use crate::errors::AppResult;
use crate::models::{Integration, Widget};

/// Fetch parameters parsed from a widget's configuration map
#[derive(Debug, Clone, Default)]
pub struct WidgetParams {
    /// Raw configuration as stored on the widget row
    pub config: Option<Value>,
}

impl WidgetParams {
    #[must_use]
    pub const fn new(config: Option<Value>) -> Self {
        Self { config }
    }

    /// Item limit from the configuration, falling back to the shared default
    #[must_use]
    pub fn limit(&self) -> usize {
        self.config
            .as_ref()
            .and_then(|config| config.get("limit"))
            .and_then(Value::as_u64)
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(limits::DEFAULT_WIDGET_LIMIT)
    }
}

/// One cacheable widget-data request
#[derive(Debug, Clone)]
pub struct WidgetRequest {
    pub user_id: i64,
    pub service_name: String,
    pub widget_type: String,
    pub config: Option<Value>,
}

impl WidgetRequest {
    /// Request for a stored dashboard widget
    #[must_use]
    pub fn from_widget(user_id: i64, widget: &Widget) -> Self {
        Self {
            user_id,
            service_name: widget.service_name.clone(),
            widget_type: widget.widget_type.clone(),
            config: widget.config.clone(),
        }
    }

    /// Headline request used by the aggregate fan-out.
    ///
    /// Carries an explicit default limit so it shares cache entries with
    /// widgets configured for the same limit.
    #[must_use]
    pub fn headline(user_id: i64, service_name: &str, widget_type: &str) -> Self {
        Self {
            user_id,
            service_name: service_name.to_owned(),
            widget_type: widget_type.to_owned(),
            config: Some(json!({ "limit": limits::DEFAULT_WIDGET_LIMIT })),
        }
    }

    /// Fetch parameters derived from this request's configuration
    #[must_use]
    pub fn params(&self) -> WidgetParams {
        WidgetParams::new(self.config.clone())
    }
}

/// A data source serving one widget kind for one external service.
///
/// Implementations receive the active integration and the widget's fetch
/// parameters, and return the success payload keyed by kind (for example
/// `{"pull_requests": [...]}`). Upstream failures surface as errors; the
/// dispatcher converts them into structured error payloads.
#[async_trait]
pub trait WidgetCapability: Send + Sync {
    /// Widget kind this capability serves
    fn kind(&self) -> &'static str;

    /// Fetch live data for the integration's user
    async fn fetch(&self, integration: &Integration, params: &WidgetParams) -> AppResult<Value>;
}
