// ABOUTME: Google APIs client plus the calendar, tasks, and emails capabilities
// ABOUTME: Refreshes expired access tokens through the OAuth token endpoint before fetching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::OAuthProviderConfig;
use crate::constants::{api, limits, oauth, services, widget_kinds};
use crate::errors::{AppError, AppResult};
use crate::models::{CalendarEvent, Email, Integration, Task};
use crate::widgets::{WidgetCapability, WidgetParams};

/// Google account profile, read for callback verification
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<EventItem>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    id: String,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: EventTime,
    end: EventTime,
}

/// Timed events carry `dateTime`; all-day events carry only `date`
#[derive(Debug, Default, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskListsResponse {
    #[serde(default)]
    items: Vec<TaskListItem>,
}

#[derive(Debug, Deserialize)]
struct TaskListItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TasksResponse {
    #[serde(default)]
    items: Vec<TaskItem>,
}

#[derive(Debug, Deserialize)]
struct TaskItem {
    id: String,
    title: Option<String>,
    notes: Option<String>,
    due: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(rename = "labelIds", default)]
    label_ids: Vec<String>,
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

/// Client for the calendar, tasks, gmail, and userinfo APIs
#[derive(Clone)]
pub struct GoogleClient {
    http: Client,
    base_url: String,
    oauth: OAuthProviderConfig,
}

impl GoogleClient {
    #[must_use]
    pub fn new(http: Client, oauth: OAuthProviderConfig) -> Self {
        Self {
            http,
            base_url: api::GOOGLE_BASE_URL.to_owned(),
            oauth,
        }
    }

    /// Access token for this request.
    ///
    /// Google access tokens expire within an hour; when the stored token has
    /// expired and a refresh token exists, a fresh token is obtained from the
    /// token endpoint. The refreshed token is used for this request only, the
    /// stored integration row is left untouched.
    async fn access_token(&self, integration: &Integration) -> AppResult<String> {
        let expired = integration
            .token_expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now());
        if !expired {
            return Ok(integration.access_token.clone());
        }

        let Some(refresh_token) = integration.refresh_token.as_deref() else {
            return Ok(integration.access_token.clone());
        };
        let (Some(client_id), Some(client_secret)) = (
            self.oauth.client_id.as_deref(),
            self.oauth.client_secret.as_deref(),
        ) else {
            warn!("Google token expired but OAuth client credentials are not configured");
            return Ok(integration.access_token.clone());
        };

        info!(
            user_id = integration.user_id,
            "Refreshing expired Google access token"
        );

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http
            .post(oauth::GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                services::GOOGLE,
                format!("Token refresh failed with status {status}: {body}"),
            ));
        }

        #[derive(Deserialize)]
        struct RefreshResponse {
            access_token: String,
        }

        let refreshed: RefreshResponse = response.json().await?;
        Ok(refreshed.access_token)
    }

    /// Authenticated GET returning a decoded JSON body
    async fn api_get<T>(
        &self,
        access_token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                services::GOOGLE,
                format!("Google API request failed with status {status}: {body}"),
            ));
        }

        Ok(response.json().await?)
    }

    /// Upcoming events on the primary calendar, soonest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh or the calendar request fails.
    pub async fn calendar_events(
        &self,
        integration: &Integration,
        limit: usize,
    ) -> AppResult<Vec<CalendarEvent>> {
        let access_token = self.access_token(integration).await?;
        let time_min = Utc::now();
        let time_max = time_min + chrono::Duration::days(limits::CALENDAR_DAYS_AHEAD);

        let response: EventsResponse = self
            .api_get(
                &access_token,
                "calendar/v3/calendars/primary/events",
                &[
                    (
                        "timeMin",
                        time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
                    ),
                    (
                        "timeMax",
                        time_max.to_rfc3339_opts(SecondsFormat::Secs, true),
                    ),
                    ("maxResults", limit.to_string()),
                    ("singleEvents", "true".to_owned()),
                    ("orderBy", "startTime".to_owned()),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(calendar_event_from_item)
            .collect())
    }

    /// Tasks across the user's task lists, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh or any tasks request fails.
    pub async fn tasks(&self, integration: &Integration, limit: usize) -> AppResult<Vec<Task>> {
        let access_token = self.access_token(integration).await?;
        let task_lists: TaskListsResponse = self
            .api_get(&access_token, "tasks/v1/users/@me/lists", &[])
            .await?;

        let mut tasks = Vec::new();
        for task_list in task_lists.items {
            let path = format!("tasks/v1/lists/{}/tasks", task_list.id);
            let page: TasksResponse = self
                .api_get(&access_token, &path, &[("maxResults", limit.to_string())])
                .await?;
            tasks.extend(page.items.into_iter().map(task_from_item));
            if tasks.len() >= limit {
                break;
            }
        }
        tasks.truncate(limit);
        Ok(tasks)
    }

    /// Recent unread-or-important Gmail messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh or any Gmail request fails.
    pub async fn emails(&self, integration: &Integration, limit: usize) -> AppResult<Vec<Email>> {
        let access_token = self.access_token(integration).await?;
        let list: MessageListResponse = self
            .api_get(
                &access_token,
                "gmail/v1/users/me/messages",
                &[
                    ("maxResults", limit.to_string()),
                    ("q", "is:unread OR is:important".to_owned()),
                ],
            )
            .await?;

        let mut emails = Vec::with_capacity(list.messages.len());
        for message in list.messages {
            let path = format!("gmail/v1/users/me/messages/{}", message.id);
            let detail: MessageResponse = self
                .api_get(
                    &access_token,
                    &path,
                    &[
                        ("format", "metadata".to_owned()),
                        ("metadataHeaders", "From".to_owned()),
                        ("metadataHeaders", "Subject".to_owned()),
                        ("metadataHeaders", "Date".to_owned()),
                    ],
                )
                .await?;
            emails.push(email_from_message(detail));
        }
        Ok(emails)
    }

    /// Profile of the token's user, used to verify OAuth callbacks.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    pub async fn user_info(&self, access_token: &str) -> AppResult<GoogleUser> {
        self.api_get(access_token, "oauth2/v2/userinfo", &[]).await
    }
}

fn calendar_event_from_item(item: EventItem) -> Option<CalendarEvent> {
    let start_time = parse_event_time(&item.start, false)?;
    let end_time = parse_event_time(&item.end, true)?;
    Some(CalendarEvent {
        id: item.id,
        title: item.summary.unwrap_or_else(|| "No Title".to_owned()),
        start_time,
        end_time,
        description: item.description,
        location: item.location,
    })
}

/// Timed events parse as RFC 3339; all-day events expand to the start or
/// end of their date.
fn parse_event_time(time: &EventTime, end_of_day: bool) -> Option<DateTime<Utc>> {
    if let Some(stamp) = &time.date_time {
        return DateTime::parse_from_rfc3339(stamp)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc));
    }
    let date = time.date.as_deref()?;
    let time_of_day = if end_of_day { "23:59:59" } else { "00:00:00" };
    DateTime::parse_from_rfc3339(&format!("{date}T{time_of_day}+00:00"))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn task_from_item(item: TaskItem) -> Task {
    Task {
        id: item.id,
        title: item.title.unwrap_or_else(|| "No Title".to_owned()),
        description: item.notes,
        due_date: item.due.as_deref().and_then(|due| {
            DateTime::parse_from_rfc3339(due)
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc))
        }),
        status: item.status.unwrap_or_else(|| "needsAction".to_owned()),
        // Google Tasks has no priority field
        priority: None,
    }
}

fn email_from_message(message: MessageResponse) -> Email {
    let mut subject = None;
    let mut sender = None;
    let mut date = None;
    let headers = message
        .payload
        .map(|payload| payload.headers)
        .unwrap_or_default();
    for header in headers {
        match header.name.as_str() {
            "Subject" => subject = Some(header.value),
            "From" => sender = Some(header.value),
            "Date" => date = Some(header.value),
            _ => {}
        }
    }

    Email {
        id: message.id,
        subject: subject.unwrap_or_else(|| "No Subject".to_owned()),
        sender: sender.unwrap_or_else(|| "Unknown".to_owned()),
        received_at: date
            .as_deref()
            .and_then(parse_rfc2822)
            .unwrap_or_else(Utc::now),
        is_read: !message.label_ids.iter().any(|label| label == "UNREAD"),
        snippet: Some(truncate_snippet(&message.snippet)),
    }
}

/// Gmail `Date` headers are RFC 2822; unparseable values fall back to now.
fn parse_rfc2822(stamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(stamp)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Snippets longer than 100 characters are cut with an ellipsis
fn truncate_snippet(snippet: &str) -> String {
    if snippet.chars().count() > 100 {
        let cut: String = snippet.chars().take(100).collect();
        format!("{cut}...")
    } else {
        snippet.to_owned()
    }
}

/// Upcoming primary-calendar events
pub struct CalendarCapability {
    client: GoogleClient,
}

impl CalendarCapability {
    #[must_use]
    pub const fn new(client: GoogleClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WidgetCapability for CalendarCapability {
    fn kind(&self) -> &'static str {
        widget_kinds::CALENDAR
    }

    async fn fetch(&self, integration: &Integration, params: &WidgetParams) -> AppResult<Value> {
        let events = self
            .client
            .calendar_events(integration, params.limit())
            .await?;
        Ok(json!({ "events": events }))
    }
}

/// Tasks across the user's task lists
pub struct TasksCapability {
    client: GoogleClient,
}

impl TasksCapability {
    #[must_use]
    pub const fn new(client: GoogleClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WidgetCapability for TasksCapability {
    fn kind(&self) -> &'static str {
        widget_kinds::TASKS
    }

    async fn fetch(&self, integration: &Integration, params: &WidgetParams) -> AppResult<Value> {
        let tasks = self.client.tasks(integration, params.limit()).await?;
        Ok(json!({ "tasks": tasks }))
    }
}

/// Recent unread-or-important emails
pub struct EmailsCapability {
    client: GoogleClient,
}

impl EmailsCapability {
    #[must_use]
    pub const fn new(client: GoogleClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WidgetCapability for EmailsCapability {
    fn kind(&self) -> &'static str {
        widget_kinds::EMAILS
    }

    async fn fetch(&self, integration: &Integration, params: &WidgetParams) -> AppResult<Value> {
        let emails = self.client.emails(integration, params.limit()).await?;
        Ok(json!({ "emails": emails }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_event_parses_rfc3339() {
        let time = EventTime {
            date_time: Some("2025-05-01T09:30:00+02:00".to_owned()),
            date: None,
        };
        let parsed = parse_event_time(&time, false).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-05-01T07:30:00+00:00");
    }

    #[test]
    fn all_day_event_expands_to_day_bounds() {
        let time = EventTime {
            date_time: None,
            date: Some("2025-05-01".to_owned()),
        };
        let start = parse_event_time(&time, false).unwrap();
        let end = parse_event_time(&time, true).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-05-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-05-01T23:59:59+00:00");
    }

    #[test]
    fn task_defaults_applied_for_sparse_items() {
        let task = task_from_item(TaskItem {
            id: "t1".to_owned(),
            title: None,
            notes: None,
            due: None,
            status: None,
        });
        assert_eq!(task.title, "No Title");
        assert_eq!(task.status, "needsAction");
        assert!(task.due_date.is_none());
        assert!(task.priority.is_none());
    }

    #[test]
    fn long_snippet_truncated_with_ellipsis() {
        let long = "x".repeat(150);
        let truncated = truncate_snippet(&long);
        assert_eq!(truncated.len(), 103);
        assert!(truncated.ends_with("..."));

        assert_eq!(truncate_snippet("short"), "short");
    }

    #[test]
    fn unread_label_controls_read_flag() {
        let message: MessageResponse = serde_json::from_value(json!({
            "id": "m1",
            "snippet": "Quarterly numbers attached",
            "labelIds": ["INBOX", "UNREAD"],
            "payload": {
                "headers": [
                    { "name": "From", "value": "cfo@example.com" },
                    { "name": "Subject", "value": "Q2 numbers" },
                    { "name": "Date", "value": "Tue, 20 May 2025 10:11:12 +0000" }
                ]
            }
        }))
        .unwrap();

        let email = email_from_message(message);
        assert!(!email.is_read);
        assert_eq!(email.subject, "Q2 numbers");
        assert_eq!(email.sender, "cfo@example.com");
        assert_eq!(email.received_at.to_rfc3339(), "2025-05-20T10:11:12+00:00");
    }
}
