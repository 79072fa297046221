// ABOUTME: Dashboard and widget storage queries
// ABOUTME: JSON config columns are stored as TEXT and decoded on read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use super::Database;
use crate::models::{Dashboard, DashboardCreate, Widget, WidgetCreate};
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Create a dashboard for the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_dashboard(
        &self,
        user_id: i64,
        dashboard: &DashboardCreate,
    ) -> Result<Dashboard> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO dashboards (user_id, name, description, is_default, layout_config, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(user_id)
        .bind(&dashboard.name)
        .bind(&dashboard.description)
        .bind(dashboard.is_default)
        .bind(dashboard.layout_config.as_ref().map(Value::to_string))
        .bind(now)
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        match self.get_dashboard(user_id, id).await? {
            Some(created) => Ok(created),
            None => Err(anyhow::anyhow!("Dashboard {id} missing after insert")),
        }
    }

    /// List the user's dashboards.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_dashboards(&self, user_id: i64) -> Result<Vec<Dashboard>> {
        let rows = sqlx::query("SELECT * FROM dashboards WHERE user_id = ?1 ORDER BY id")
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(row_to_dashboard).collect()
    }

    /// Fetch one of the user's dashboards by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_dashboard(
        &self,
        user_id: i64,
        dashboard_id: i64,
    ) -> Result<Option<Dashboard>> {
        let row = sqlx::query("SELECT * FROM dashboards WHERE id = ?1 AND user_id = ?2")
            .bind(dashboard_id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_dashboard(&row)?)),
            None => Ok(None),
        }
    }

    /// Add a widget to a dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_widget(&self, dashboard_id: i64, widget: &WidgetCreate) -> Result<Widget> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO widgets
                (dashboard_id, widget_type, service_name, position_x, position_y, width, height, config, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)
            "#,
        )
        .bind(dashboard_id)
        .bind(&widget.widget_type)
        .bind(&widget.service_name)
        .bind(widget.position_x)
        .bind(widget.position_y)
        .bind(widget.width)
        .bind(widget.height)
        .bind(widget.config.as_ref().map(Value::to_string))
        .bind(now)
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        match self.get_widget(id).await? {
            Some(created) => Ok(created),
            None => Err(anyhow::anyhow!("Widget {id} missing after insert")),
        }
    }

    /// Fetch a widget by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_widget(&self, widget_id: i64) -> Result<Option<Widget>> {
        let row = sqlx::query("SELECT * FROM widgets WHERE id = ?1")
            .bind(widget_id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_widget(&row)?)),
            None => Ok(None),
        }
    }

    /// List the active widgets on a dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active_widgets(&self, dashboard_id: i64) -> Result<Vec<Widget>> {
        let rows = sqlx::query(
            "SELECT * FROM widgets WHERE dashboard_id = ?1 AND is_active = 1 ORDER BY id",
        )
        .bind(dashboard_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_widget).collect()
    }
}

fn row_to_dashboard(row: &SqliteRow) -> Result<Dashboard> {
    Ok(Dashboard {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_default: row.try_get("is_default")?,
        layout_config: text_to_json(row.try_get("layout_config")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_widget(row: &SqliteRow) -> Result<Widget> {
    Ok(Widget {
        id: row.try_get("id")?,
        dashboard_id: row.try_get("dashboard_id")?,
        widget_type: row.try_get("widget_type")?,
        service_name: row.try_get("service_name")?,
        position_x: row.try_get("position_x")?,
        position_y: row.try_get("position_y")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        config: text_to_json(row.try_get("config")?)?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn text_to_json(text: Option<String>) -> Result<Option<Value>> {
    text.map(|raw| serde_json::from_str(&raw))
        .transpose()
        .context("Invalid JSON in config column")
}
