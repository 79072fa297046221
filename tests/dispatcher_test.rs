// ABOUTME: Integration tests for the widget dispatcher's cache-or-fetch path
// ABOUTME: Uses counting and failing fakes to verify hit, miss, and degradation behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use synq_server::cache::{
    CacheConfig, CacheProvider, CacheStats, CacheTtlConfig, Fingerprint, InMemoryCache,
};
use synq_server::credentials::CredentialResolver;
use synq_server::database::Database;
use synq_server::errors::{AppError, AppResult};
use synq_server::models::Integration;
use synq_server::widgets::{
    CapabilityRegistry, WidgetCapability, WidgetDispatcher, WidgetParams, WidgetRequest,
};

/// Capability fake that counts upstream fetches
struct CountingCapability {
    kind: &'static str,
    payload: Value,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl WidgetCapability for CountingCapability {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn fetch(&self, _integration: &Integration, _params: &WidgetParams) -> AppResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// Capability fake that always fails upstream
struct FailingCapability;

#[async_trait]
impl WidgetCapability for FailingCapability {
    fn kind(&self) -> &'static str {
        "pull_requests"
    }

    async fn fetch(&self, _integration: &Integration, _params: &WidgetParams) -> AppResult<Value> {
        Err(AppError::external_service("github", "rate limited"))
    }
}

/// Cache fake whose every operation fails
struct FailingCache;

#[async_trait]
impl CacheProvider for FailingCache {
    async fn set(&self, _key: &Fingerprint, _value: &Value, _ttl: Duration) -> AppResult<()> {
        Err(AppError::cache_unavailable("set failed"))
    }

    async fn get(&self, _key: &Fingerprint) -> AppResult<Option<Value>> {
        Err(AppError::cache_unavailable("get failed"))
    }

    async fn invalidate(&self, _key: &Fingerprint) -> AppResult<()> {
        Err(AppError::cache_unavailable("invalidate failed"))
    }

    async fn invalidate_pattern(&self, _pattern: &str) -> AppResult<u64> {
        Err(AppError::cache_unavailable("invalidate failed"))
    }

    async fn ttl(&self, _key: &Fingerprint) -> AppResult<Option<Duration>> {
        Err(AppError::cache_unavailable("ttl failed"))
    }

    async fn stats(&self) -> AppResult<CacheStats> {
        Err(AppError::cache_unavailable("stats failed"))
    }

    async fn health_check(&self) -> AppResult<()> {
        Err(AppError::cache_unavailable("unhealthy"))
    }
}

/// Helper: in-memory database with one user
async fn seeded_database() -> Result<(Database, i64)> {
    let database = Database::new("sqlite::memory:").await?;
    database.migrate().await?;
    let user = database.create_user("casey", "casey@example.com").await?;
    Ok((database, user.id))
}

/// Helper: connect a service for the user
async fn connect(database: &Database, user_id: i64, service: &str) -> Result<()> {
    database
        .upsert_integration(user_id, service, "token", None, None)
        .await?;
    Ok(())
}

/// Helper: TTL config with distinct success and error windows
fn test_ttl() -> CacheTtlConfig {
    CacheTtlConfig {
        success: Duration::from_secs(600),
        error: Duration::from_secs(60),
        notes: Duration::from_secs(120),
    }
}

fn memory_cache() -> Arc<dyn CacheProvider> {
    Arc::new(InMemoryCache::new(&CacheConfig::default()))
}

fn counting_registry(calls: &Arc<AtomicUsize>) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register(
        "github",
        Arc::new(CountingCapability {
            kind: "pull_requests",
            payload: json!({ "pull_requests": [{ "id": 1, "title": "Fix cache eviction" }] }),
            calls: Arc::clone(calls),
        }),
    );
    registry
}

fn github_request(user_id: i64, limit: u64) -> WidgetRequest {
    WidgetRequest {
        user_id,
        service_name: "github".to_owned(),
        widget_type: "pull_requests".to_owned(),
        config: Some(json!({ "limit": limit })),
    }
}

#[tokio::test]
async fn test_second_request_within_ttl_served_from_cache() -> Result<()> {
    let (database, user_id) = seeded_database().await?;
    connect(&database, user_id, "github").await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = WidgetDispatcher::new(
        memory_cache(),
        CredentialResolver::new(database),
        Arc::new(counting_registry(&calls)),
        test_ttl(),
    );

    let request = github_request(user_id, 10);
    let first = dispatcher.widget_data(&request).await;
    let second = dispatcher.widget_data(&request).await;

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_distinct_limits_fetch_separately() -> Result<()> {
    let (database, user_id) = seeded_database().await?;
    connect(&database, user_id, "github").await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = WidgetDispatcher::new(
        memory_cache(),
        CredentialResolver::new(database),
        Arc::new(counting_registry(&calls)),
        test_ttl(),
    );

    dispatcher.widget_data(&github_request(user_id, 10)).await;
    dispatcher.widget_data(&github_request(user_id, 20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Both entries now live in the cache independently
    dispatcher.widget_data(&github_request(user_id, 10)).await;
    dispatcher.widget_data(&github_request(user_id, 20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_config_key_order_shares_cache_entry() -> Result<()> {
    let (database, user_id) = seeded_database().await?;
    connect(&database, user_id, "github").await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = WidgetDispatcher::new(
        memory_cache(),
        CredentialResolver::new(database),
        Arc::new(counting_registry(&calls)),
        test_ttl(),
    );

    let mut first = github_request(user_id, 10);
    first.config = Some(json!({ "limit": 10, "state": "open" }));
    let mut second = github_request(user_id, 10);
    second.config = Some(json!({ "state": "open", "limit": 10 }));

    dispatcher.widget_data(&first).await;
    dispatcher.widget_data(&second).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_integration_error_is_cached_with_short_ttl() -> Result<()> {
    let (database, user_id) = seeded_database().await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let cache = memory_cache();
    let dispatcher = WidgetDispatcher::new(
        Arc::clone(&cache),
        CredentialResolver::new(database),
        Arc::new(counting_registry(&calls)),
        test_ttl(),
    );

    let request = WidgetRequest {
        user_id,
        service_name: "github".to_owned(),
        widget_type: "pull_requests".to_owned(),
        config: None,
    };
    let payload = dispatcher.widget_data(&request).await;

    assert_eq!(
        payload,
        json!({ "error": "No active github integration found" })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let fingerprint = Fingerprint::for_request(user_id, "github", "pull_requests", None);
    let remaining = cache.ttl(&fingerprint).await?.expect("error entry cached");
    assert!(remaining <= Duration::from_secs(60));

    // The cached error serves the repeat request
    let repeat = dispatcher.widget_data(&request).await;
    assert_eq!(repeat, payload);
    Ok(())
}

#[tokio::test]
async fn test_inactive_integration_treated_as_disconnected() -> Result<()> {
    let (database, user_id) = seeded_database().await?;
    connect(&database, user_id, "github").await?;
    sqlx::query("UPDATE integrations SET is_active = 0 WHERE user_id = ?1")
        .bind(user_id)
        .execute(database.pool())
        .await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = WidgetDispatcher::new(
        memory_cache(),
        CredentialResolver::new(database),
        Arc::new(counting_registry(&calls)),
        test_ttl(),
    );

    let payload = dispatcher.widget_data(&github_request(user_id, 10)).await;

    assert_eq!(
        payload,
        json!({ "error": "No active github integration found" })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_upstream_failure_becomes_error_payload() -> Result<()> {
    let (database, user_id) = seeded_database().await?;
    connect(&database, user_id, "github").await?;

    let mut registry = CapabilityRegistry::new();
    registry.register("github", Arc::new(FailingCapability));
    let cache = memory_cache();
    let dispatcher = WidgetDispatcher::new(
        Arc::clone(&cache),
        CredentialResolver::new(database),
        Arc::new(registry),
        test_ttl(),
    );

    let request = github_request(user_id, 10);
    let payload = dispatcher.widget_data(&request).await;

    assert_eq!(
        payload,
        json!({ "error": "Failed to fetch data: github: rate limited" })
    );

    let fingerprint =
        Fingerprint::for_request(user_id, "github", "pull_requests", request.config.as_ref());
    let remaining = cache.ttl(&fingerprint).await?.expect("error entry cached");
    assert!(remaining <= Duration::from_secs(60));
    Ok(())
}

#[tokio::test]
async fn test_unsupported_widget_type_payload() -> Result<()> {
    let (database, user_id) = seeded_database().await?;
    connect(&database, user_id, "github").await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = WidgetDispatcher::new(
        memory_cache(),
        CredentialResolver::new(database),
        Arc::new(counting_registry(&calls)),
        test_ttl(),
    );

    let request = WidgetRequest {
        user_id,
        service_name: "github".to_owned(),
        widget_type: "tickets".to_owned(),
        config: None,
    };
    let payload = dispatcher.widget_data(&request).await;

    assert_eq!(
        payload,
        json!({ "error": "Unsupported widget type: tickets for service: github" })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_success_outlives_error_in_cache() -> Result<()> {
    let (database, user_id) = seeded_database().await?;
    connect(&database, user_id, "github").await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let cache = memory_cache();
    let dispatcher = WidgetDispatcher::new(
        Arc::clone(&cache),
        CredentialResolver::new(database),
        Arc::new(counting_registry(&calls)),
        test_ttl(),
    );

    // Success entry for the connected service, error entry for jira
    dispatcher.widget_data(&github_request(user_id, 10)).await;
    dispatcher
        .widget_data(&WidgetRequest {
            user_id,
            service_name: "jira".to_owned(),
            widget_type: "tickets".to_owned(),
            config: None,
        })
        .await;

    let success_key = Fingerprint::for_request(
        user_id,
        "github",
        "pull_requests",
        Some(&json!({ "limit": 10 })),
    );
    let error_key = Fingerprint::for_request(user_id, "jira", "tickets", None);

    let success_ttl = cache.ttl(&success_key).await?.expect("success cached");
    let error_ttl = cache.ttl(&error_key).await?.expect("error cached");
    assert!(success_ttl > error_ttl);
    Ok(())
}

#[tokio::test]
async fn test_failing_cache_degrades_to_fresh_fetches() -> Result<()> {
    let (database, user_id) = seeded_database().await?;
    connect(&database, user_id, "github").await?;

    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = WidgetDispatcher::new(
        Arc::new(FailingCache),
        CredentialResolver::new(database),
        Arc::new(counting_registry(&calls)),
        test_ttl(),
    );

    let request = github_request(user_id, 10);
    let first = dispatcher.widget_data(&request).await;
    let second = dispatcher.widget_data(&request).await;

    // Every request fetches fresh, but callers still get real payloads
    assert_eq!(first, second);
    assert!(first.get("pull_requests").is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}
