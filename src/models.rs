// ABOUTME: Core data models for users, integrations, dashboards, widgets, and notes
// ABOUTME: Also defines the typed provider items and the aggregate dashboard payload
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! # Data Models
//!
//! Persistent entities, request bodies, and the typed items returned by the
//! provider capabilities. Provider items are serialized into generic JSON
//! payloads at the capability boundary; the rest of the system treats widget
//! data as opaque `serde_json::Value`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A dashboard user. Account management lives in the fronting gateway;
/// this table exists as the foreign-key parent for integrations,
/// dashboards, and notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A connected external service credential for one user.
///
/// At most one row exists per (user, service); reconnecting replaces the
/// tokens and reactivates the row. Token fields never serialize into API
/// responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: i64,
    pub user_id: i64,
    pub service_name: String,
    #[serde(skip_serializing, default)]
    pub access_token: String,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-owned dashboard grouping widgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub layout_config: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A widget on a dashboard: which service, which kind of data, and the
/// fetch configuration that participates in the cache fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub id: i64,
    pub dashboard_id: i64,
    pub widget_type: String,
    pub service_name: String,
    pub position_x: i64,
    pub position_y: i64,
    pub width: i64,
    pub height: i64,
    pub config: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An internal note. Notes never touch the credential or capability path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /dashboards`
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub layout_config: Option<Value>,
}

/// Request body for `POST /dashboards/:id/widgets/integration`
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetCreate {
    pub widget_type: String,
    pub service_name: String,
    #[serde(default)]
    pub position_x: i64,
    #[serde(default)]
    pub position_y: i64,
    #[serde(default = "default_widget_dimension")]
    pub width: i64,
    #[serde(default = "default_widget_dimension")]
    pub height: i64,
    #[serde(default)]
    pub config: Option<Value>,
}

fn default_widget_dimension() -> i64 {
    1
}

/// Request body for `POST /notes`
#[derive(Debug, Clone, Deserialize)]
pub struct NoteCreate {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

/// Request body for `PUT /notes/:id`; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
}

/// A widget together with its live (or cached) data payload
#[derive(Debug, Clone, Serialize)]
pub struct WidgetWithData {
    #[serde(flatten)]
    pub widget: Widget,
    pub data: Value,
}

/// A dashboard with its widgets and their data payloads
#[derive(Debug, Clone, Serialize)]
pub struct DashboardWithData {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    pub widgets: Vec<WidgetWithData>,
}

/// An open pull request involving the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: String,
    pub repository: String,
}

/// An upcoming calendar event from the user's primary calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// A task from the user's task lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub priority: Option<String>,
}

/// A recent email, metadata only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub snippet: Option<String>,
}

/// A ticket assigned to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub key: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The merged aggregate dashboard payload.
///
/// Every category defaults to an empty list; a failing or disconnected
/// service leaves its categories empty instead of failing the aggregate.
/// Items stay as JSON values because they come back through the cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateData {
    pub calendar_events: Vec<Value>,
    pub tasks: Vec<Value>,
    pub pull_requests: Vec<Value>,
    pub tickets: Vec<Value>,
    pub emails: Vec<Value>,
}
