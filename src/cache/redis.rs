// ABOUTME: Redis cache backend with connection pooling and TTL support
// ABOUTME: Provides shared caching for multi-instance deployments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use super::{CacheProvider, CacheStats, Fingerprint};
use crate::constants::cache::FINGERPRINT_NAMESPACE;
use crate::errors::{AppError, AppResult};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

const CONNECTION_TIMEOUT_SECS: u64 = 5;
const RESPONSE_TIMEOUT_SECS: u64 = 5;
const INITIAL_CONNECTION_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;
const MAX_RETRY_DELAY_MS: u64 = 5_000;
const RECONNECTION_RETRIES: usize = 6;
const RETRY_EXPONENT_BASE: u64 = 2;
const SCAN_BATCH_SIZE: usize = 100;

/// Redis cache backend with connection pooling
///
/// Uses Redis `ConnectionManager` for automatic reconnection. Fingerprints
/// already carry the `synq:cache:v1` namespace, so keys are stored verbatim
/// and pattern invalidation maps directly onto Redis `SCAN MATCH`.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection cannot be
    /// established after retries.
    pub async fn connect(redis_url: &str) -> AppResult<Self> {
        info!(
            "Connecting to Redis at {} (timeout={}s, retries={})",
            redis_url, CONNECTION_TIMEOUT_SECS, INITIAL_CONNECTION_RETRIES
        );

        let client = redis::Client::open(redis_url).map_err(|e| {
            AppError::cache_unavailable(format!("Failed to create Redis client: {e}"))
        })?;

        let manager = Self::connect_with_retry(&client).await?;

        info!("Successfully connected to Redis");

        Ok(Self { manager })
    }

    /// Connect with exponential backoff on initial connection failure.
    async fn connect_with_retry(client: &redis::Client) -> AppResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
            .set_response_timeout(Duration::from_secs(RESPONSE_TIMEOUT_SECS))
            .set_number_of_retries(RECONNECTION_RETRIES)
            .set_exponent_base(RETRY_EXPONENT_BASE)
            .set_max_delay(MAX_RETRY_DELAY_MS);

        let mut last_error = None;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        for attempt in 0..=INITIAL_CONNECTION_RETRIES {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await
            {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("Redis connection established after {} retries", attempt);
                    }
                    return Ok(manager);
                }
                Err(e) => {
                    last_error = Some(e);

                    if attempt < INITIAL_CONNECTION_RETRIES {
                        warn!(
                            "Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                            attempt + 1,
                            INITIAL_CONNECTION_RETRIES + 1,
                            delay_ms,
                            last_error
                                .as_ref()
                                .map_or_else(|| "unknown".to_owned(), ToString::to_string)
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        // Exponential backoff with cap
                        delay_ms = (delay_ms * 2).min(MAX_RETRY_DELAY_MS);
                    }
                }
            }
        }

        Err(AppError::cache_unavailable(format!(
            "Failed to connect to Redis after {} attempts: {}",
            INITIAL_CONNECTION_RETRIES + 1,
            last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )))
    }

    /// Count keys in our namespace using cursor-based SCAN.
    async fn count_entries(&self) -> AppResult<u64> {
        let pattern = format!("{FINGERPRINT_NAMESPACE}:*");
        let mut conn = self.manager.clone();
        let mut cursor = 0u64;
        let mut count = 0u64;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    error!("Redis SCAN failed: {}", e);
                    AppError::cache_unavailable(format!("Cache error: {e}"))
                })?;

            count += keys.len() as u64;
            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(count)
    }
}

/// Extract a numeric counter from a Redis INFO block.
///
/// INFO lines look like `keyspace_hits:12345` and are CRLF terminated.
fn parse_info_counter(info: &str, field: &str) -> Option<u64> {
    info.lines().find_map(|line| {
        line.strip_prefix(field)
            .and_then(|rest| rest.strip_prefix(':'))
            .and_then(|value| value.trim().parse().ok())
    })
}

#[async_trait::async_trait]
impl CacheProvider for RedisCache {
    async fn set(&self, key: &Fingerprint, value: &Value, ttl: Duration) -> AppResult<()> {
        let serialized = serde_json::to_vec(value)?;
        let mut conn = self.manager.clone();

        // SET with EX applies value and expiration in one atomic operation
        conn.set_ex::<_, _, ()>(key.as_str(), serialized, ttl.as_secs())
            .await
            .map_err(|e| {
                error!("Redis SET operation failed: {}", e);
                AppError::cache_unavailable(format!("Cache error: {e}"))
            })?;

        Ok(())
    }

    async fn get(&self, key: &Fingerprint) -> AppResult<Option<Value>> {
        let mut conn = self.manager.clone();

        let data: Option<Vec<u8>> = conn.get(key.as_str()).await.map_err(|e| {
            error!("Redis GET operation failed: {}", e);
            AppError::cache_unavailable(format!("Cache error: {e}"))
        })?;

        match data {
            Some(bytes) => {
                let value: Value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn invalidate(&self, key: &Fingerprint) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let _: () = conn.del(key.as_str()).await.map_err(|e| {
            error!("Redis DEL operation failed: {}", e);
            AppError::cache_unavailable(format!("Cache error: {e}"))
        })?;

        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> AppResult<u64> {
        let mut conn = self.manager.clone();
        let mut count = 0u64;

        // SCAN is cursor-based and safe against large keyspaces; glob and
        // Redis MATCH share wildcard syntax so patterns pass through as-is
        let mut cursor = 0u64;
        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    error!("Redis SCAN failed: {}", e);
                    AppError::cache_unavailable(format!("Cache error: {e}"))
                })?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await.map_err(|e| {
                    error!("Redis DEL failed: {}", e);
                    AppError::cache_unavailable(format!("Cache error: {e}"))
                })?;
                count += deleted;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(count)
    }

    async fn ttl(&self, key: &Fingerprint) -> AppResult<Option<Duration>> {
        let mut conn = self.manager.clone();

        let ttl_secs: i64 = conn.ttl(key.as_str()).await.map_err(|e| {
            error!("Redis TTL operation failed: {}", e);
            AppError::cache_unavailable(format!("Cache error: {e}"))
        })?;

        // Redis returns -2 if the key doesn't exist, -1 if it has no expiration
        match ttl_secs {
            secs if secs > 0 => Ok(Some(Duration::from_secs(secs as u64))),
            _ => Ok(None),
        }
    }

    async fn stats(&self) -> AppResult<CacheStats> {
        let entries = self.count_entries().await?;

        let mut conn = self.manager.clone();
        let info: String = redis::cmd("INFO")
            .arg("stats")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis INFO failed: {}", e);
                AppError::cache_unavailable(format!("Cache error: {e}"))
            })?;

        Ok(CacheStats {
            backend: "redis".to_owned(),
            entries: Some(entries),
            hits: parse_info_counter(&info, "keyspace_hits"),
            misses: parse_info_counter(&info, "keyspace_misses"),
        })
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis PING failed: {}", e);
                AppError::cache_unavailable(format!("Cache error: {e}"))
            })?;

        if response == "PONG" {
            Ok(())
        } else {
            Err(AppError::cache_unavailable(format!(
                "Unexpected PING response '{response}'"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_info_counters_with_crlf_lines() {
        let info = "# Stats\r\ntotal_connections_received:5\r\nkeyspace_hits:42\r\nkeyspace_misses:7\r\n";
        assert_eq!(parse_info_counter(info, "keyspace_hits"), Some(42));
        assert_eq!(parse_info_counter(info, "keyspace_misses"), Some(7));
        assert_eq!(parse_info_counter(info, "expired_keys"), None);
    }

    #[test]
    fn info_counter_requires_exact_field_delimiter() {
        let info = "keyspace_hits_extra:9\nkeyspace_hits:3\n";
        assert_eq!(parse_info_counter(info, "keyspace_hits"), Some(3));
    }
}
