// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into typed config sections with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! Environment-based configuration management for production deployment

use crate::cache::{CacheConfig, CacheTtlConfig};
use crate::constants::{defaults, env as env_keys};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

/// Top-level server configuration assembled from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Cache backend configuration
    pub cache: CacheSettings,
    /// Widget aggregation configuration
    pub aggregation: AggregationConfig,
    /// OAuth provider configurations
    pub oauth: OAuthConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database URL
    pub url: String,
}

/// Cache backend settings as read from the environment.
///
/// Converted into [`CacheConfig`] with [`CacheSettings::to_cache_config`] when
/// the backend is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Redis URL; the in-memory backend is used when unset
    pub redis_url: Option<String>,
    /// Maximum entries for the in-memory backend
    pub max_entries: usize,
    /// Expired-entry sweep interval in seconds
    pub cleanup_interval_secs: u64,
    /// TTL for successful widget payloads in seconds
    pub success_ttl_secs: u64,
    /// TTL for error payloads in seconds
    pub error_ttl_secs: u64,
    /// TTL for cached note listings in seconds
    pub notes_ttl_secs: u64,
}

impl CacheSettings {
    /// Convert the flat environment settings into a backend config.
    #[must_use]
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.max_entries,
            redis_url: self.redis_url.clone(),
            cleanup_interval: Duration::from_secs(self.cleanup_interval_secs),
            // Enable background cleanup for production use
            enable_background_cleanup: true,
            ttl: CacheTtlConfig {
                success: Duration::from_secs(self.success_ttl_secs),
                error: Duration::from_secs(self.error_ttl_secs),
                notes: Duration::from_secs(self.notes_ttl_secs),
            },
        }
    }
}

/// Aggregation behavior for the combined dashboard feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Wall-clock budget in seconds for one aggregate request
    pub deadline_secs: u64,
    /// Per-call timeout in seconds for upstream provider requests
    pub provider_timeout_secs: u64,
}

impl AggregationConfig {
    /// Aggregate deadline as a [`Duration`].
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Upstream provider timeout as a [`Duration`].
    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// OAuth provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// GitHub OAuth configuration
    pub github: OAuthProviderConfig,
    /// Google OAuth configuration
    pub google: OAuthProviderConfig,
    /// Jira OAuth configuration
    pub jira: OAuthProviderConfig,
}

/// Credentials and redirect target for one OAuth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProviderConfig {
    /// OAuth client ID
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// OAuth redirect URI
    pub redirect_uri: String,
}

impl OAuthProviderConfig {
    /// Whether both client credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable fails to parse or validation fails.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            http_port: env_var_or(env_keys::HTTP_PORT, &defaults::HTTP_PORT.to_string())?
                .parse()
                .context("Invalid HTTP_PORT value")?,

            database: DatabaseConfig {
                url: env_var_or(env_keys::DATABASE_URL, defaults::DATABASE_URL)?,
            },

            cache: CacheSettings {
                redis_url: env::var(env_keys::REDIS_URL).ok(),
                max_entries: env_var_or(
                    env_keys::CACHE_MAX_ENTRIES,
                    &defaults::CACHE_MAX_ENTRIES.to_string(),
                )?
                .parse()
                .context("Invalid CACHE_MAX_ENTRIES value")?,
                cleanup_interval_secs: env_var_or(
                    env_keys::CACHE_CLEANUP_INTERVAL_SECS,
                    &defaults::CACHE_CLEANUP_INTERVAL_SECS.to_string(),
                )?
                .parse()
                .context("Invalid CACHE_CLEANUP_INTERVAL_SECS value")?,
                success_ttl_secs: env_var_or(
                    env_keys::CACHE_SUCCESS_TTL_SECS,
                    &defaults::CACHE_SUCCESS_TTL_SECS.to_string(),
                )?
                .parse()
                .context("Invalid CACHE_SUCCESS_TTL_SECS value")?,
                error_ttl_secs: env_var_or(
                    env_keys::CACHE_ERROR_TTL_SECS,
                    &defaults::CACHE_ERROR_TTL_SECS.to_string(),
                )?
                .parse()
                .context("Invalid CACHE_ERROR_TTL_SECS value")?,
                notes_ttl_secs: env_var_or(
                    env_keys::CACHE_NOTES_TTL_SECS,
                    &defaults::CACHE_NOTES_TTL_SECS.to_string(),
                )?
                .parse()
                .context("Invalid CACHE_NOTES_TTL_SECS value")?,
            },

            aggregation: AggregationConfig {
                deadline_secs: env_var_or(
                    env_keys::AGGREGATE_DEADLINE_SECS,
                    &defaults::AGGREGATE_DEADLINE_SECS.to_string(),
                )?
                .parse()
                .context("Invalid AGGREGATE_DEADLINE_SECS value")?,
                provider_timeout_secs: env_var_or(
                    env_keys::PROVIDER_API_TIMEOUT_SECS,
                    &defaults::PROVIDER_API_TIMEOUT_SECS.to_string(),
                )?
                .parse()
                .context("Invalid PROVIDER_API_TIMEOUT_SECS value")?,
            },

            oauth: OAuthConfig {
                github: OAuthProviderConfig {
                    client_id: env::var(env_keys::GITHUB_CLIENT_ID).ok(),
                    client_secret: env::var(env_keys::GITHUB_CLIENT_SECRET).ok(),
                    redirect_uri: env_var_or(
                        env_keys::GITHUB_REDIRECT_URI,
                        defaults::GITHUB_REDIRECT_URI,
                    )?,
                },
                google: OAuthProviderConfig {
                    client_id: env::var(env_keys::GOOGLE_CLIENT_ID).ok(),
                    client_secret: env::var(env_keys::GOOGLE_CLIENT_SECRET).ok(),
                    redirect_uri: env_var_or(
                        env_keys::GOOGLE_REDIRECT_URI,
                        defaults::GOOGLE_REDIRECT_URI,
                    )?,
                },
                jira: OAuthProviderConfig {
                    client_id: env::var(env_keys::JIRA_CLIENT_ID).ok(),
                    client_secret: env::var(env_keys::JIRA_CLIENT_SECRET).ok(),
                    redirect_uri: env_var_or(
                        env_keys::JIRA_REDIRECT_URI,
                        defaults::JIRA_REDIRECT_URI,
                    )?,
                },
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when values are contradictory, such as an error TTL
    /// that is not shorter than the success TTL.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL cannot be empty"));
        }

        // Error payloads must expire before success payloads so transient
        // upstream failures get retried sooner
        if self.cache.error_ttl_secs >= self.cache.success_ttl_secs {
            return Err(anyhow::anyhow!(
                "CACHE_ERROR_TTL_SECS must be shorter than CACHE_SUCCESS_TTL_SECS"
            ));
        }

        if self.aggregation.deadline_secs == 0 {
            return Err(anyhow::anyhow!("AGGREGATE_DEADLINE_SECS must be positive"));
        }

        if self.aggregation.provider_timeout_secs >= self.aggregation.deadline_secs {
            warn!("Provider timeout is not shorter than the aggregate deadline; slow providers will consume the whole budget");
        }

        for (name, provider) in [
            ("GitHub", &self.oauth.github),
            ("Google", &self.oauth.google),
            ("Jira", &self.oauth.jira),
        ] {
            let partially_configured = provider.client_id.is_some() != provider.client_secret.is_some();
            if partially_configured {
                warn!("{name} OAuth is missing client_id or client_secret; connect flow will be unavailable");
            }
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Synq Dashboard Server Configuration:\n\
             - HTTP Port: {}\n\
             - Database: {}\n\
             - Cache Backend: {}\n\
             - Cache TTLs: success={}s error={}s notes={}s\n\
             - Aggregate Deadline: {}s\n\
             - Provider Timeout: {}s\n\
             - GitHub OAuth: {}\n\
             - Google OAuth: {}\n\
             - Jira OAuth: {}",
            self.http_port,
            self.database.url,
            if self.cache.redis_url.is_some() {
                "redis"
            } else {
                "memory"
            },
            self.cache.success_ttl_secs,
            self.cache.error_ttl_secs,
            self.cache.notes_ttl_secs,
            self.aggregation.deadline_secs,
            self.aggregation.provider_timeout_secs,
            enabled_or_disabled(self.oauth.github.is_configured()),
            enabled_or_disabled(self.oauth.google.is_configured()),
            enabled_or_disabled(self.oauth.jira.is_configured()),
        )
    }
}

fn enabled_or_disabled(configured: bool) -> &'static str {
    if configured {
        "Enabled"
    } else {
        "Disabled"
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_config() -> ServerConfig {
        ServerConfig {
            http_port: 8000,
            database: DatabaseConfig {
                url: "sqlite::memory:".to_owned(),
            },
            cache: CacheSettings {
                redis_url: None,
                max_entries: 100,
                cleanup_interval_secs: 60,
                success_ttl_secs: 600,
                error_ttl_secs: 60,
                notes_ttl_secs: 120,
            },
            aggregation: AggregationConfig {
                deadline_secs: 15,
                provider_timeout_secs: 10,
            },
            oauth: OAuthConfig {
                github: OAuthProviderConfig {
                    client_id: None,
                    client_secret: None,
                    redirect_uri: "http://localhost:8000/integrations/github/callback".to_owned(),
                },
                google: OAuthProviderConfig {
                    client_id: None,
                    client_secret: None,
                    redirect_uri: "http://localhost:8000/integrations/google/callback".to_owned(),
                },
                jira: OAuthProviderConfig {
                    client_id: None,
                    client_secret: None,
                    redirect_uri: "http://localhost:8000/integrations/jira/callback".to_owned(),
                },
            },
        }
    }

    #[test]
    #[serial]
    fn defaults_when_env_unset() {
        for key in [
            "HTTP_PORT",
            "DATABASE_URL",
            "REDIS_URL",
            "CACHE_MAX_ENTRIES",
            "CACHE_SUCCESS_TTL_SECS",
            "CACHE_ERROR_TTL_SECS",
            "CACHE_NOTES_TTL_SECS",
            "AGGREGATE_DEADLINE_SECS",
            "PROVIDER_API_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.cache.success_ttl_secs, 600);
        assert_eq!(config.cache.error_ttl_secs, 60);
        assert_eq!(config.cache.notes_ttl_secs, 120);
        assert_eq!(config.aggregation.deadline_secs, 15);
        assert!(config.cache.redis_url.is_none());
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        env::set_var("HTTP_PORT", "9123");
        env::set_var("CACHE_SUCCESS_TTL_SECS", "900");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 9123);
        assert_eq!(config.cache.success_ttl_secs, 900);

        env::remove_var("HTTP_PORT");
        env::remove_var("CACHE_SUCCESS_TTL_SECS");
    }

    #[test]
    fn validation_rejects_error_ttl_not_shorter_than_success() {
        let mut config = test_config();
        config.cache.error_ttl_secs = 600;
        assert!(config.validate().is_err());

        config.cache.error_ttl_secs = 601;
        assert!(config.validate().is_err());

        config.cache.error_ttl_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_deadline() {
        let mut config = test_config();
        config.aggregation.deadline_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn summary_reports_backend_without_secrets() {
        let mut config = test_config();
        config.oauth.github.client_id = Some("id-123".to_owned());
        config.oauth.github.client_secret = Some("super-secret".to_owned());
        config.cache.redis_url = Some("redis://cache:6379".to_owned());

        let summary = config.summary();
        assert!(summary.contains("redis"));
        assert!(summary.contains("GitHub OAuth: Enabled"));
        assert!(!summary.contains("super-secret"));
    }

    #[test]
    fn ttl_conversion_produces_durations() {
        let config = test_config();
        let cache_config = config.cache.to_cache_config();
        assert_eq!(cache_config.ttl.success, Duration::from_secs(600));
        assert_eq!(cache_config.ttl.error, Duration::from_secs(60));
        assert!(cache_config.enable_background_cleanup);
    }
}
