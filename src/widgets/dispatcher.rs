// ABOUTME: Widget dispatch state machine: cache lookup, credential resolution, capability invoke
// ABOUTME: Every outcome is a well-formed payload; error payloads are cached with the short TTL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{CapabilityRegistry, WidgetRequest};
use crate::cache::{CacheProvider, CacheTtlConfig, Fingerprint};
use crate::credentials::CredentialResolver;

/// Dispatches widget-data requests through the cache and capability layers.
///
/// The dispatch path is terminal at the first applicable branch: a cache hit
/// returns immediately with zero further I/O; a missing or inactive
/// integration, an unregistered `(service, widget_type)` pair, and an
/// upstream failure each produce an `{"error": reason}` payload cached with
/// the short error TTL; a successful fetch is cached with the long success
/// TTL. Exactly one cache write happens per miss.
///
/// Cache failures never propagate. A broken cache degrades to fetching
/// fresh on every request.
#[derive(Clone)]
pub struct WidgetDispatcher {
    cache: Arc<dyn CacheProvider>,
    credentials: CredentialResolver,
    registry: Arc<CapabilityRegistry>,
    ttl: CacheTtlConfig,
}

impl WidgetDispatcher {
    #[must_use]
    pub fn new(
        cache: Arc<dyn CacheProvider>,
        credentials: CredentialResolver,
        registry: Arc<CapabilityRegistry>,
        ttl: CacheTtlConfig,
    ) -> Self {
        Self {
            cache,
            credentials,
            registry,
            ttl,
        }
    }

    /// Serve the payload for one widget request
    pub async fn widget_data(&self, request: &WidgetRequest) -> Value {
        let fingerprint = Fingerprint::for_request(
            request.user_id,
            &request.service_name,
            &request.widget_type,
            request.config.as_ref(),
        );

        match self.cache.get(&fingerprint).await {
            Ok(Some(payload)) => {
                debug!(key = %fingerprint, "widget cache hit");
                return payload;
            }
            Ok(None) => debug!(key = %fingerprint, "widget cache miss"),
            Err(e) => warn!(key = %fingerprint, "cache read failed, fetching fresh: {e}"),
        }

        let (payload, ttl) = self.fetch_fresh(request).await;

        if let Err(e) = self.cache.set(&fingerprint, &payload, ttl).await {
            warn!(key = %fingerprint, "cache write failed: {e}");
        }

        payload
    }

    async fn fetch_fresh(&self, request: &WidgetRequest) -> (Value, Duration) {
        let integration = match self
            .credentials
            .active(request.user_id, &request.service_name)
            .await
        {
            Ok(Some(integration)) => integration,
            Ok(None) => {
                return (
                    error_payload(format!(
                        "No active {} integration found",
                        request.service_name
                    )),
                    self.ttl.error,
                );
            }
            Err(e) => {
                warn!(
                    user_id = request.user_id,
                    service = %request.service_name,
                    "credential lookup failed: {e}"
                );
                return (
                    error_payload(format!("Failed to fetch data: {e}")),
                    self.ttl.error,
                );
            }
        };

        let Some(capability) = self
            .registry
            .resolve(&request.service_name, &request.widget_type)
        else {
            return (
                error_payload(format!(
                    "Unsupported widget type: {} for service: {}",
                    request.widget_type, request.service_name
                )),
                self.ttl.error,
            );
        };

        match capability.fetch(&integration, &request.params()).await {
            Ok(payload) => (payload, self.ttl.success),
            Err(error) => {
                warn!(
                    service = %request.service_name,
                    widget = %request.widget_type,
                    "widget fetch failed: {error}"
                );
                (
                    error_payload(format!("Failed to fetch data: {}", error.message)),
                    self.ttl.error,
                )
            }
        }
    }
}

fn error_payload(message: String) -> Value {
    json!({ "error": message })
}
