// ABOUTME: Response cache for widget payloads keyed by deterministic fingerprints
// ABOUTME: Defines the CacheProvider trait, fingerprint derivation, and backend config
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

pub mod factory;
pub mod memory;
pub mod redis;

pub use factory::create_cache;
pub use memory::InMemoryCache;
pub use redis::RedisCache;

use crate::constants::cache::{EMPTY_CONFIG_TOKEN, FINGERPRINT_NAMESPACE};
use crate::constants::defaults;
use crate::errors::AppResult;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Deterministic cache key for one widget data request.
///
/// Two requests share a fingerprint exactly when they would fetch the same
/// upstream data: same user, same service, same widget type, and a canonically
/// equal configuration. Key order inside the configuration object does not
/// affect the fingerprint; differing values (for example `limit: 10` versus
/// `limit: 20`) always produce distinct fingerprints.
///
/// Rendered form:
/// `synq:cache:v1:{user_id}:{service}:{widget_type}:{config_digest}` where the
/// digest is the SHA-256 hex of the canonical JSON encoding, or the literal
/// token `none` when the request carried no configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint for a widget data request.
    ///
    /// `config` values of `None`, JSON `null`, and `{}` are all treated as
    /// "no configuration" and share the same fingerprint.
    #[must_use]
    pub fn for_request(
        user_id: i64,
        service_name: &str,
        widget_type: &str,
        config: Option<&Value>,
    ) -> Self {
        let digest = config.map_or_else(|| EMPTY_CONFIG_TOKEN.to_owned(), Self::config_digest);
        Self(format!(
            "{FINGERPRINT_NAMESPACE}:{user_id}:{service_name}:{widget_type}:{digest}"
        ))
    }

    fn config_digest(config: &Value) -> String {
        let is_empty =
            config.is_null() || config.as_object().is_some_and(serde_json::Map::is_empty);
        if is_empty {
            return EMPTY_CONFIG_TOKEN.to_owned();
        }
        let mut canonical = String::new();
        write_canonical(config, &mut canonical);
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Glob pattern matching every cache entry belonging to `user_id`.
    #[must_use]
    pub fn user_pattern(user_id: i64) -> String {
        format!("{FINGERPRINT_NAMESPACE}:{user_id}:*")
    }

    /// Glob pattern matching every entry for one of the user's services.
    #[must_use]
    pub fn service_pattern(user_id: i64, service_name: &str) -> String {
        format!("{FINGERPRINT_NAMESPACE}:{user_id}:{service_name}:*")
    }

    /// The fingerprint as a raw key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append the canonical encoding of `value` to `out`.
///
/// Object keys are emitted in ascending byte order so maps with the same
/// entries encode identically regardless of insertion order. Scalars and
/// arrays use their compact `serde_json` rendering.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by_key(|(key, _)| key.as_str());
            out.push('{');
            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Per-outcome TTLs for cached payloads.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtlConfig {
    /// TTL for successfully fetched widget payloads.
    pub success: Duration,
    /// TTL for error payloads. Shorter than `success` so transient upstream
    /// failures are retried sooner.
    pub error: Duration,
    /// TTL for cached note listings.
    pub notes: Duration,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            success: Duration::from_secs(defaults::CACHE_SUCCESS_TTL_SECS),
            error: Duration::from_secs(defaults::CACHE_ERROR_TTL_SECS),
            notes: Duration::from_secs(defaults::CACHE_NOTES_TTL_SECS),
        }
    }
}

/// Cache backend configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum entries held by the in-memory backend before LRU eviction.
    pub max_entries: usize,
    /// Redis connection URL. When unset the in-memory backend is used.
    pub redis_url: Option<String>,
    /// How often the in-memory backend sweeps expired entries.
    pub cleanup_interval: Duration,
    /// Whether the in-memory backend spawns its background sweep task.
    /// Defaults to off so short-lived test caches do not leak tasks.
    pub enable_background_cleanup: bool,
    /// Per-outcome TTLs.
    pub ttl: CacheTtlConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: defaults::CACHE_MAX_ENTRIES,
            redis_url: None,
            cleanup_interval: Duration::from_secs(defaults::CACHE_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: false,
            ttl: CacheTtlConfig::default(),
        }
    }
}

/// Backend statistics surfaced through the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Backend identifier (`memory` or `redis`).
    pub backend: String,
    /// Live entry count, when the backend can report it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<u64>,
    /// Hits served since startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits: Option<u64>,
    /// Misses since startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misses: Option<u64>,
}

/// Storage backend for cached widget payloads.
///
/// The trait is object safe so the dispatcher holds an `Arc<dyn CacheProvider>`
/// and tests can substitute in-memory or deliberately failing backends.
/// Payloads are stored serialized; a `get` within the TTL returns a value that
/// re-serializes byte-identically to what was stored.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use serde_json::json;
/// use synq_server::cache::{CacheConfig, CacheProvider, Fingerprint, InMemoryCache};
///
/// # async fn example() -> synq_server::errors::AppResult<()> {
/// let cache: Arc<dyn CacheProvider> = Arc::new(InMemoryCache::new(&CacheConfig::default()));
/// let key = Fingerprint::for_request(7, "github", "pull_requests", None);
/// cache
///     .set(&key, &json!({"pull_requests": []}), Duration::from_secs(600))
///     .await?;
/// assert!(cache.get(&key).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync {
    /// Store `value` under `key` for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    async fn set(&self, key: &Fingerprint, value: &Value, ttl: Duration) -> AppResult<()>;

    /// Fetch the payload stored under `key`, or `None` when absent or expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or deserialization fails.
    async fn get(&self, key: &Fingerprint) -> AppResult<Option<Value>>;

    /// Remove a single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    async fn invalidate(&self, key: &Fingerprint) -> AppResult<()>;

    /// Remove every entry whose key matches `pattern`, returning the count.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend scan or delete fails.
    async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64>;

    /// Remaining TTL for `key`, or `None` when absent or already expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend lookup fails.
    async fn ttl(&self, key: &Fingerprint) -> AppResult<Option<Duration>>;

    /// Remove every entry belonging to `user_id`, returning the count.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend scan or delete fails.
    async fn clear_user(&self, user_id: i64) -> AppResult<u64> {
        self.invalidate_pattern(&Fingerprint::user_pattern(user_id))
            .await
    }

    /// Backend statistics for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report statistics.
    async fn stats(&self) -> AppResult<CacheStats>;

    /// Verify the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unhealthy.
    async fn health_check(&self) -> AppResult<()>;
}
