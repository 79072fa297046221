// ABOUTME: Database management for users, integrations, dashboards, and notes
// ABOUTME: Owns the SQLite pool, schema migrations, and connection health checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! # Database Management
//!
//! SQLite-backed storage for the dashboard server. Domain queries live in the
//! submodules; this module owns the pool and the schema.

pub mod dashboards;
pub mod integrations;
pub mod notes;
pub mod users;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database handle shared across the server
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open a database connection pool and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // In-memory SQLite databases exist per connection, so the pool must
        // hold exactly one connection and never reap it
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(database_url)
                .await?
        } else {
            // mode=rwc makes SQLite create the database file if missing
            let connection_options = if database_url.starts_with("sqlite:") {
                format!("{database_url}?mode=rwc")
            } else {
                database_url.to_owned()
            };
            SqlitePool::connect(&connection_options).await?
        };

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// Every statement is idempotent so repeated startups are safe.
    ///
    /// # Errors
    ///
    /// Returns an error if a schema statement fails.
    pub async fn migrate(&self) -> Result<()> {
        // Users table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Service integrations; one row per user and service
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS integrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                service_name TEXT NOT NULL,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                token_expires_at TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (user_id, service_name),
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_integrations_user_id ON integrations(user_id)",
        )
        .execute(&self.pool)
        .await?;

        // Dashboards
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dashboards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                is_default BOOLEAN NOT NULL DEFAULT 0,
                layout_config TEXT, -- JSON object
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_dashboards_user_id ON dashboards(user_id)")
            .execute(&self.pool)
            .await?;

        // Widgets placed on dashboards
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS widgets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                dashboard_id INTEGER NOT NULL,
                widget_type TEXT NOT NULL,
                service_name TEXT NOT NULL,
                position_x INTEGER NOT NULL DEFAULT 0,
                position_y INTEGER NOT NULL DEFAULT 0,
                width INTEGER NOT NULL DEFAULT 1,
                height INTEGER NOT NULL DEFAULT 1,
                config TEXT, -- JSON object
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (dashboard_id) REFERENCES dashboards (id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_widgets_dashboard_id ON widgets(dashboard_id)")
            .execute(&self.pool)
            .await?;

        // Notes
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT,
                is_pinned BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_notes_user_id ON notes(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Verify the database answers queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe query fails.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
