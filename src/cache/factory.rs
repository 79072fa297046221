// ABOUTME: Cache factory for configuration-based backend selection
// ABOUTME: Falls back to the in-memory backend when Redis is unreachable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use super::{memory::InMemoryCache, redis::RedisCache, CacheConfig, CacheProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Create the cache backend selected by `config`.
///
/// When `redis_url` is set, Redis is tried first; a connection failure logs a
/// warning and falls back to the in-memory backend so the server keeps serving
/// requests without a cache outage becoming a startup failure.
pub async fn create_cache(config: &CacheConfig) -> Arc<dyn CacheProvider> {
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url).await {
            Ok(cache) => {
                info!("Cache backend: redis");
                return Arc::new(cache);
            }
            Err(e) => {
                warn!("Redis cache unavailable, falling back to in-memory cache: {e}");
            }
        }
    }

    info!(
        "Cache backend: memory (max entries: {})",
        config.max_entries
    );
    Arc::new(InMemoryCache::new(config))
}
