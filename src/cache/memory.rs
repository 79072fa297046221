// ABOUTME: In-memory cache backend with LRU eviction and TTL support
// ABOUTME: Includes hit/miss counters and a background sweep for expired entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use super::{CacheConfig, CacheProvider, CacheStats, Fingerprint};
use crate::errors::{AppError, AppResult};
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// In-memory cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }
}

/// In-memory cache with LRU eviction and background cleanup
///
/// Uses `Arc<RwLock<LruCache>>` for shared state between cache operations and
/// the background cleanup task. The Arc is required because the cleanup task
/// (spawned in [`InMemoryCache::new`]) needs shared ownership of the store to
/// remove expired entries concurrently. `LruCache` provides O(1) eviction of
/// least-recently-used entries once `max_entries` is reached.
#[derive(Clone)]
pub struct InMemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    shutdown_tx: Option<Arc<tokio::sync::mpsc::Sender<()>>>,
}

impl InMemoryCache {
    /// Default cache capacity when config specifies zero entries
    const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a new in-memory cache.
    ///
    /// When `config.enable_background_cleanup` is set this spawns a sweep task
    /// on the current Tokio runtime, so it must be called from runtime context.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        // LruCache requires NonZeroUsize for capacity
        let capacity =
            NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CACHE_CAPACITY);

        let store = Arc::new(RwLock::new(LruCache::new(capacity)));

        let shutdown_tx = if config.enable_background_cleanup {
            let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
            let store_clone = Arc::clone(&store);
            let cleanup_interval = config.cleanup_interval;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(cleanup_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            Self::cleanup_expired(&store_clone).await;
                        }
                        _ = shutdown_rx.recv() => {
                            tracing::debug!("Cache cleanup task received shutdown signal");
                            break;
                        }
                    }
                }
            });

            Some(Arc::new(shutdown_tx))
        } else {
            None
        };

        Self {
            store,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            shutdown_tx,
        }
    }

    /// Remove all expired entries from the store
    async fn cleanup_expired(store: &Arc<RwLock<LruCache<String, CacheEntry>>>) {
        let mut store_guard = store.write().await;

        // Collect expired keys first (can't modify while iterating)
        let expired_keys: Vec<String> = store_guard
            .iter()
            .filter_map(|(k, v)| {
                if v.is_expired() {
                    Some(k.clone())
                } else {
                    None
                }
            })
            .collect();

        for key in &expired_keys {
            store_guard.pop(key);
        }

        let removed = expired_keys.len();
        drop(store_guard);
        if removed > 0 {
            tracing::debug!("Cleaned up {} expired cache entries", removed);
        }
    }
}

#[async_trait::async_trait]
impl CacheProvider for InMemoryCache {
    async fn set(&self, key: &Fingerprint, value: &Value, ttl: Duration) -> AppResult<()> {
        let serialized = serde_json::to_vec(value)?;
        let entry = CacheEntry::new(serialized, ttl);

        // LruCache handles eviction automatically on push
        self.store.write().await.push(key.as_str().to_owned(), entry);

        Ok(())
    }

    async fn get(&self, key: &Fingerprint) -> AppResult<Option<Value>> {
        let mut store = self.store.write().await;

        // LruCache::get is mutable (updates access order for LRU)
        if let Some(entry) = store.get(key.as_str()) {
            if entry.is_expired() {
                store.pop(key.as_str());
                drop(store);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }

            let value: Value = serde_json::from_slice(&entry.data)?;
            drop(store);
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(value));
        }
        drop(store);
        self.misses.fetch_add(1, Ordering::Relaxed);

        Ok(None)
    }

    async fn invalidate(&self, key: &Fingerprint) -> AppResult<()> {
        self.store.write().await.pop(key.as_str());
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64> {
        let mut store = self.store.write().await;

        // Fingerprint patterns like "synq:cache:v1:7:github:*" are plain globs
        let glob_pattern = glob::Pattern::new(pattern)
            .map_err(|e| AppError::internal(format!("Invalid glob pattern '{pattern}': {e}")))?;

        // Collect keys to remove (can't modify while iterating)
        let keys_to_remove: Vec<String> = store
            .iter()
            .filter_map(|(k, _)| {
                if glob_pattern.matches(k) {
                    Some(k.clone())
                } else {
                    None
                }
            })
            .collect();

        for key in &keys_to_remove {
            store.pop(key);
        }

        let removed = keys_to_remove.len() as u64;
        drop(store);

        Ok(removed)
    }

    async fn ttl(&self, key: &Fingerprint) -> AppResult<Option<Duration>> {
        let store = self.store.read().await;
        Ok(store
            .peek(key.as_str())
            .and_then(CacheEntry::remaining_ttl))
    }

    async fn stats(&self) -> AppResult<CacheStats> {
        let entries = u64::try_from(self.store.read().await.len()).unwrap_or(u64::MAX);
        Ok(CacheStats {
            backend: "memory".to_owned(),
            entries: Some(entries),
            hits: Some(self.hits.load(Ordering::Relaxed)),
            misses: Some(self.misses.load(Ordering::Relaxed)),
        })
    }

    async fn health_check(&self) -> AppResult<()> {
        // Acquiring the lock proves the store is not wedged
        drop(self.store.read().await);
        Ok(())
    }
}

impl Drop for InMemoryCache {
    fn drop(&mut self) {
        if let Some(tx) = &self.shutdown_tx {
            // Best effort: the cleanup task may already be gone during shutdown
            let _ = tx.try_send(());
        }
    }
}
