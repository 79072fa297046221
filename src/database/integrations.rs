// ABOUTME: Service integration storage queries
// ABOUTME: Active-integration lookups and token upserts keyed by user and service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use super::Database;
use crate::models::Integration;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Fetch one of the user's integrations regardless of its active state.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_integration(
        &self,
        user_id: i64,
        service_name: &str,
    ) -> Result<Option<Integration>> {
        let row = sqlx::query(
            "SELECT * FROM integrations WHERE user_id = ?1 AND service_name = ?2",
        )
        .bind(user_id)
        .bind(service_name)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_integration(&row)?)),
            None => Ok(None),
        }
    }

    /// Fetch the active integration for one of the user's services.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_active_integration(
        &self,
        user_id: i64,
        service_name: &str,
    ) -> Result<Option<Integration>> {
        let row = sqlx::query(
            "SELECT * FROM integrations WHERE user_id = ?1 AND service_name = ?2 AND is_active = 1",
        )
        .bind(user_id)
        .bind(service_name)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_integration(&row)?)),
            None => Ok(None),
        }
    }

    /// List all of the user's integrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_integrations(&self, user_id: i64) -> Result<Vec<Integration>> {
        let rows = sqlx::query(
            "SELECT * FROM integrations WHERE user_id = ?1 ORDER BY service_name",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_integration).collect()
    }

    /// List the user's active integrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active_integrations(&self, user_id: i64) -> Result<Vec<Integration>> {
        let rows = sqlx::query(
            "SELECT * FROM integrations WHERE user_id = ?1 AND is_active = 1 ORDER BY service_name",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_integration).collect()
    }

    /// Insert or refresh the integration for `(user_id, service_name)`.
    ///
    /// A re-connect replaces stored tokens and reactivates the integration.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_integration(
        &self,
        user_id: i64,
        service_name: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expires_at: Option<DateTime<Utc>>,
    ) -> Result<Integration> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO integrations
                (user_id, service_name, access_token, refresh_token, token_expires_at, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            ON CONFLICT (user_id, service_name) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_expires_at = excluded.token_expires_at,
                is_active = 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(service_name)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expires_at)
        .bind(now)
        .execute(self.pool())
        .await?;

        match self.get_integration(user_id, service_name).await? {
            Some(integration) => Ok(integration),
            None => Err(anyhow::anyhow!(
                "Integration for user {user_id} service {service_name} missing after upsert"
            )),
        }
    }
}

fn row_to_integration(row: &SqliteRow) -> Result<Integration> {
    Ok(Integration {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        service_name: row.try_get("service_name")?,
        access_token: row.try_get("access_token")?,
        refresh_token: row.try_get("refresh_token")?,
        token_expires_at: row.try_get("token_expires_at")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
