// ABOUTME: Unit tests for the in-memory cache backend
// ABOUTME: Covers TTL expiration, LRU capacity eviction, and pattern invalidation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use anyhow::Result;
use serde_json::json;
use std::time::Duration;
use synq_server::cache::{CacheConfig, CacheProvider, Fingerprint, InMemoryCache};

/// Helper: Create an in-memory cache with a custom capacity
fn create_test_cache(max_entries: usize) -> InMemoryCache {
    let config = CacheConfig {
        max_entries,
        redis_url: None,
        cleanup_interval: Duration::from_secs(300),
        // Disabled in tests so short-lived caches do not leak tasks
        enable_background_cleanup: false,
        ttl: synq_server::cache::CacheTtlConfig::default(),
    };
    InMemoryCache::new(&config)
}

/// Helper: Fingerprint for a widget request with a limit config
fn limit_fingerprint(user_id: i64, widget_type: &str, limit: u64) -> Fingerprint {
    Fingerprint::for_request(user_id, "github", widget_type, Some(&json!({ "limit": limit })))
}

#[tokio::test]
async fn test_cache_set_and_get() -> Result<()> {
    let cache = create_test_cache(100);
    let key = limit_fingerprint(1, "pull_requests", 10);
    let payload = json!({ "pull_requests": [{ "id": 42, "title": "Fix flaky test" }] });

    cache.set(&key, &payload, Duration::from_secs(10)).await?;

    let retrieved = cache.get(&key).await?;
    assert_eq!(retrieved, Some(payload));
    Ok(())
}

#[tokio::test]
async fn test_cache_expiration() -> Result<()> {
    let cache = create_test_cache(100);
    let key = limit_fingerprint(1, "pull_requests", 10);
    let payload = json!({ "pull_requests": [] });

    cache.set(&key, &payload, Duration::from_millis(100)).await?;
    assert!(cache.get(&key).await?.is_some());

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.get(&key).await?, None);
    assert_eq!(cache.ttl(&key).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_capacity_eviction_drops_least_recent() -> Result<()> {
    let cache = create_test_cache(2);
    let first = limit_fingerprint(1, "pull_requests", 10);
    let second = limit_fingerprint(1, "issues", 10);
    let third = limit_fingerprint(1, "notifications", 10);
    let ttl = Duration::from_secs(60);

    cache.set(&first, &json!({ "n": 1 }), ttl).await?;
    cache.set(&second, &json!({ "n": 2 }), ttl).await?;

    // Touch `first` so `second` becomes the eviction candidate
    assert!(cache.get(&first).await?.is_some());

    cache.set(&third, &json!({ "n": 3 }), ttl).await?;

    assert!(cache.get(&first).await?.is_some());
    assert_eq!(cache.get(&second).await?, None);
    assert!(cache.get(&third).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_invalidate_single_entry() -> Result<()> {
    let cache = create_test_cache(100);
    let key = limit_fingerprint(1, "tickets", 10);

    cache
        .set(&key, &json!({ "tickets": [] }), Duration::from_secs(60))
        .await?;
    cache.invalidate(&key).await?;

    assert_eq!(cache.get(&key).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_pattern_invalidation_scopes_to_service() -> Result<()> {
    let cache = create_test_cache(100);
    let ttl = Duration::from_secs(60);
    let github_prs = limit_fingerprint(7, "pull_requests", 10);
    let github_issues = limit_fingerprint(7, "issues", 10);
    let jira = Fingerprint::for_request(7, "jira", "tickets", None);
    let other_user = limit_fingerprint(8, "pull_requests", 10);

    cache.set(&github_prs, &json!({ "n": 1 }), ttl).await?;
    cache.set(&github_issues, &json!({ "n": 2 }), ttl).await?;
    cache.set(&jira, &json!({ "n": 3 }), ttl).await?;
    cache.set(&other_user, &json!({ "n": 4 }), ttl).await?;

    let removed = cache
        .invalidate_pattern(&Fingerprint::service_pattern(7, "github"))
        .await?;

    assert_eq!(removed, 2);
    assert_eq!(cache.get(&github_prs).await?, None);
    assert_eq!(cache.get(&github_issues).await?, None);
    assert!(cache.get(&jira).await?.is_some());
    assert!(cache.get(&other_user).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_clear_user_removes_every_service() -> Result<()> {
    let cache = create_test_cache(100);
    let ttl = Duration::from_secs(60);
    let github = limit_fingerprint(7, "pull_requests", 10);
    let jira = Fingerprint::for_request(7, "jira", "tickets", None);
    let other_user = limit_fingerprint(8, "pull_requests", 10);

    cache.set(&github, &json!({ "n": 1 }), ttl).await?;
    cache.set(&jira, &json!({ "n": 2 }), ttl).await?;
    cache.set(&other_user, &json!({ "n": 3 }), ttl).await?;

    let removed = cache.clear_user(7).await?;

    assert_eq!(removed, 2);
    assert_eq!(cache.get(&github).await?, None);
    assert_eq!(cache.get(&jira).await?, None);
    assert!(cache.get(&other_user).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_ttl_reports_remaining_time() -> Result<()> {
    let cache = create_test_cache(100);
    let key = limit_fingerprint(1, "calendar", 10);

    cache
        .set(&key, &json!({ "events": [] }), Duration::from_secs(600))
        .await?;

    let remaining = cache.ttl(&key).await?.expect("entry should have a TTL");
    assert!(remaining <= Duration::from_secs(600));
    assert!(remaining > Duration::from_secs(590));
    Ok(())
}

#[tokio::test]
async fn test_last_write_wins() -> Result<()> {
    let cache = create_test_cache(100);
    let key = limit_fingerprint(1, "tasks", 10);
    let ttl = Duration::from_secs(60);

    cache.set(&key, &json!({ "tasks": ["old"] }), ttl).await?;
    cache.set(&key, &json!({ "tasks": ["new"] }), ttl).await?;

    assert_eq!(cache.get(&key).await?, Some(json!({ "tasks": ["new"] })));
    Ok(())
}

#[tokio::test]
async fn test_stats_track_hits_and_misses() -> Result<()> {
    let cache = create_test_cache(100);
    let key = limit_fingerprint(1, "emails", 10);

    // One miss, then one hit
    assert_eq!(cache.get(&key).await?, None);
    cache
        .set(&key, &json!({ "emails": [] }), Duration::from_secs(60))
        .await?;
    assert!(cache.get(&key).await?.is_some());

    let stats = cache.stats().await?;
    assert_eq!(stats.backend, "memory");
    assert_eq!(stats.entries, Some(1));
    assert_eq!(stats.hits, Some(1));
    assert_eq!(stats.misses, Some(1));
    Ok(())
}

#[tokio::test]
async fn test_health_check_reports_healthy() -> Result<()> {
    let cache = create_test_cache(100);
    cache.health_check().await?;
    Ok(())
}
