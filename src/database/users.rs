// ABOUTME: User storage queries
// ABOUTME: Row mapping and lookups for the users table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use super::Database;
use crate::models::User;
use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Create a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including unique violations on
    /// username or email.
    pub async fn create_user(&self, username: &str, email: &str) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, is_active, created_at, updated_at)
            VALUES (?1, ?2, 1, ?3, ?3)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(now)
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        match self.get_user(id).await? {
            Some(user) => Ok(user),
            None => Err(anyhow::anyhow!("User {id} missing after insert")),
        }
    }

    /// Get user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
