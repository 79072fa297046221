// ABOUTME: Application-wide constants organized by domain
// ABOUTME: Environment variable names, defaults, service identifiers, and endpoint URLs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! Constants module
//!
//! Centralizes the strings and defaults shared across modules so service
//! names, cache namespaces, and environment variable keys are never
//! hardcoded twice.

/// Environment variable names read by `ServerConfig::from_env`
pub mod env {
    /// HTTP server port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// SQLite database URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Optional Redis URL; unset selects the in-memory cache backend
    pub const REDIS_URL: &str = "REDIS_URL";
    /// Maximum entries held by the in-memory cache backend
    pub const CACHE_MAX_ENTRIES: &str = "CACHE_MAX_ENTRIES";
    /// Seconds between expired-entry cleanup sweeps
    pub const CACHE_CLEANUP_INTERVAL_SECS: &str = "CACHE_CLEANUP_INTERVAL_SECS";
    /// TTL in seconds for successful widget payloads
    pub const CACHE_SUCCESS_TTL_SECS: &str = "CACHE_SUCCESS_TTL_SECS";
    /// TTL in seconds for error widget payloads
    pub const CACHE_ERROR_TTL_SECS: &str = "CACHE_ERROR_TTL_SECS";
    /// TTL in seconds for cached internal data (notes lists)
    pub const CACHE_NOTES_TTL_SECS: &str = "CACHE_NOTES_TTL_SECS";
    /// Overall deadline in seconds for the aggregate dashboard fan-out
    pub const AGGREGATE_DEADLINE_SECS: &str = "AGGREGATE_DEADLINE_SECS";
    /// Per-request timeout in seconds for upstream provider calls
    pub const PROVIDER_API_TIMEOUT_SECS: &str = "PROVIDER_API_TIMEOUT_SECS";
    /// Log output format: pretty, json, or compact
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    /// Default log level when `RUST_LOG` is unset
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    /// GitHub OAuth application client id
    pub const GITHUB_CLIENT_ID: &str = "GITHUB_CLIENT_ID";
    /// GitHub OAuth application client secret
    pub const GITHUB_CLIENT_SECRET: &str = "GITHUB_CLIENT_SECRET";
    /// GitHub OAuth redirect URI
    pub const GITHUB_REDIRECT_URI: &str = "GITHUB_REDIRECT_URI";
    /// Google OAuth application client id
    pub const GOOGLE_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
    /// Google OAuth application client secret
    pub const GOOGLE_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
    /// Google OAuth redirect URI
    pub const GOOGLE_REDIRECT_URI: &str = "GOOGLE_REDIRECT_URI";
    /// Atlassian OAuth application client id
    pub const JIRA_CLIENT_ID: &str = "JIRA_CLIENT_ID";
    /// Atlassian OAuth application client secret
    pub const JIRA_CLIENT_SECRET: &str = "JIRA_CLIENT_SECRET";
    /// Atlassian OAuth redirect URI
    pub const JIRA_REDIRECT_URI: &str = "JIRA_REDIRECT_URI";
}

/// Default values applied when the environment leaves settings unset
pub mod defaults {
    /// Default HTTP port
    pub const HTTP_PORT: u16 = 8000;
    /// Default SQLite database URL
    pub const DATABASE_URL: &str = "sqlite:./data/synq.db";
    /// Default in-memory cache capacity
    pub const CACHE_MAX_ENTRIES: usize = 10_000;
    /// Default cleanup sweep interval in seconds
    pub const CACHE_CLEANUP_INTERVAL_SECS: u64 = 60;
    /// Default success payload TTL: 10 minutes
    pub const CACHE_SUCCESS_TTL_SECS: u64 = 600;
    /// Default error payload TTL: 1 minute
    pub const CACHE_ERROR_TTL_SECS: u64 = 60;
    /// Default internal-data TTL: 2 minutes
    pub const CACHE_NOTES_TTL_SECS: u64 = 120;
    /// Default aggregate fan-out deadline in seconds
    pub const AGGREGATE_DEADLINE_SECS: u64 = 15;
    /// Default upstream provider timeout in seconds
    pub const PROVIDER_API_TIMEOUT_SECS: u64 = 10;
    /// Default HTTP request timeout in seconds for the server middleware
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Default GitHub OAuth callback
    pub const GITHUB_REDIRECT_URI: &str = "http://localhost:8000/integrations/github/callback";
    /// Default Google OAuth callback
    pub const GOOGLE_REDIRECT_URI: &str = "http://localhost:8000/integrations/google/callback";
    /// Default Jira OAuth callback
    pub const JIRA_REDIRECT_URI: &str = "http://localhost:8000/integrations/jira/callback";
}

/// External service identifiers stored in integration and widget rows
pub mod services {
    /// GitHub service identifier
    pub const GITHUB: &str = "github";
    /// Google service identifier
    pub const GOOGLE: &str = "google";
    /// Jira (Atlassian cloud) service identifier
    pub const JIRA: &str = "jira";
    /// Internal notes pseudo-service used for cache fingerprints
    pub const NOTES: &str = "notes";

    /// Services that can be connected through the OAuth flow
    pub const CONNECTABLE: &[&str] = &[GITHUB, GOOGLE, JIRA];
}

/// Widget kind identifiers stored in widget rows
pub mod widget_kinds {
    /// Open pull requests involving the user (GitHub)
    pub const PULL_REQUESTS: &str = "pull_requests";
    /// Open issues assigned to the user (GitHub)
    pub const ISSUES: &str = "issues";
    /// Notification feed (GitHub)
    pub const NOTIFICATIONS: &str = "notifications";
    /// Upcoming primary-calendar events (Google)
    pub const CALENDAR: &str = "calendar";
    /// Tasks across the user's task lists (Google)
    pub const TASKS: &str = "tasks";
    /// Recent unread-or-important emails (Google)
    pub const EMAILS: &str = "emails";
    /// Tickets assigned to the user (Jira)
    pub const TICKETS: &str = "tickets";
}

/// Cache fingerprint construction
pub mod cache {
    /// Versioned namespace prefixing every fingerprint
    pub const FINGERPRINT_NAMESPACE: &str = "synq:cache:v1";
    /// Token standing in for an absent or empty configuration map
    pub const EMPTY_CONFIG_TOKEN: &str = "none";
}

/// Fetch limits
pub mod limits {
    /// Default number of items a widget fetch returns
    pub const DEFAULT_WIDGET_LIMIT: usize = 10;
    /// Default number of notes returned by list and search
    pub const DEFAULT_NOTES_LIMIT: i64 = 20;
    /// Days ahead scanned for upcoming calendar events
    pub const CALENDAR_DAYS_AHEAD: i64 = 7;
}

/// Upstream API base URLs
pub mod api {
    /// GitHub REST API
    pub const GITHUB_BASE_URL: &str = "https://api.github.com";
    /// Google APIs front door (calendar, tasks, gmail)
    pub const GOOGLE_BASE_URL: &str = "https://www.googleapis.com";
    /// Atlassian cloud API gateway
    pub const ATLASSIAN_BASE_URL: &str = "https://api.atlassian.com";
}

/// OAuth endpoints and scope strings per provider
pub mod oauth {
    /// GitHub authorization endpoint
    pub const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
    /// GitHub token exchange endpoint
    pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
    /// GitHub scopes (comma-separated as GitHub expects)
    pub const GITHUB_SCOPES: &str = "repo,user:email,read:org,notifications";

    /// Google authorization endpoint
    pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
    /// Google token exchange endpoint
    pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
    /// Google scopes (space-separated as Google expects)
    pub const GOOGLE_SCOPES: &str = "https://www.googleapis.com/auth/calendar \
         https://www.googleapis.com/auth/gmail.readonly \
         https://www.googleapis.com/auth/userinfo.email \
         https://www.googleapis.com/auth/userinfo.profile \
         openid";

    /// Atlassian authorization endpoint
    pub const JIRA_AUTH_URL: &str = "https://auth.atlassian.com/authorize";
    /// Atlassian token exchange endpoint
    pub const JIRA_TOKEN_URL: &str = "https://auth.atlassian.com/oauth/token";
    /// Audience parameter required by the Atlassian authorization endpoint
    pub const JIRA_AUDIENCE: &str = "api.atlassian.com";
    /// Jira scopes (space-separated as Atlassian expects)
    pub const JIRA_SCOPES: &str = "read:jira-user read:jira-work write:jira-work";
}

/// HTTP header carrying the gateway-authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// User agent sent on upstream provider requests
pub const USER_AGENT: &str = concat!("synq-server/", env!("CARGO_PKG_VERSION"));
