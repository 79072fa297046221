// ABOUTME: GitHub REST API client plus the pull_requests, issues, and notifications capabilities
// ABOUTME: Search-API backed fetches scoped to the authenticated user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::{api, services, widget_kinds};
use crate::errors::{AppError, AppResult};
use crate::models::{Integration, PullRequest};
use crate::widgets::{WidgetCapability, WidgetParams};

/// GitHub user profile, read for search qualifiers and callback verification
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Search API envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

/// Issue or pull request row from the search API
#[derive(Debug, Deserialize)]
struct SearchItem {
    id: i64,
    title: String,
    html_url: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user: Option<SearchUser>,
    repository_url: String,
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct SearchUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

/// Notification thread from the notifications API
#[derive(Debug, Deserialize)]
struct NotificationThread {
    id: String,
    subject: NotificationSubject,
    reason: String,
    updated_at: DateTime<Utc>,
    repository: Option<NotificationRepository>,
    unread: bool,
}

#[derive(Debug, Deserialize)]
struct NotificationSubject {
    title: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct NotificationRepository {
    full_name: String,
}

/// Minimal GitHub REST client covering the widget data needs
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    base_url: String,
}

impl GithubClient {
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: api::GITHUB_BASE_URL.to_owned(),
        }
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
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                services::GITHUB,
                format!("GitHub API request failed with status {status}: {body}"),
            ));
        }

        Ok(response.json().await?)
    }

    /// Profile of the token's user; also used to verify OAuth callbacks.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    pub async fn authenticated_user(&self, access_token: &str) -> AppResult<GithubUser> {
        self.api_get(access_token, "user", &[]).await
    }

    /// Open pull requests involving the user, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile lookup or the search fails.
    pub async fn pull_requests(
        &self,
        access_token: &str,
        limit: usize,
    ) -> AppResult<Vec<PullRequest>> {
        let user = self.authenticated_user(access_token).await?;
        let search: SearchResponse = self
            .api_get(
                access_token,
                "search/issues",
                &[
                    ("q", format!("is:pr is:open involves:{}", user.login)),
                    ("sort", "updated".to_owned()),
                    ("order", "desc".to_owned()),
                    ("per_page", limit.to_string()),
                ],
            )
            .await?;

        Ok(search
            .items
            .into_iter()
            .map(pull_request_from_item)
            .collect())
    }

    /// Open issues assigned to the user as generic JSON items.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile lookup or the search fails.
    pub async fn assigned_issues(
        &self,
        access_token: &str,
        limit: usize,
    ) -> AppResult<Vec<Value>> {
        let user = self.authenticated_user(access_token).await?;
        let search: SearchResponse = self
            .api_get(
                access_token,
                "search/issues",
                &[
                    ("q", format!("assignee:{} is:issue is:open", user.login)),
                    ("sort", "updated".to_owned()),
                    ("order", "desc".to_owned()),
                    ("per_page", limit.to_string()),
                ],
            )
            .await?;

        Ok(search.items.into_iter().map(issue_item).collect())
    }

    /// Unread notification threads as generic JSON items.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn notifications(&self, access_token: &str, limit: usize) -> AppResult<Vec<Value>> {
        let threads: Vec<NotificationThread> = self
            .api_get(
                access_token,
                "notifications",
                &[("per_page", limit.to_string())],
            )
            .await?;

        Ok(threads.into_iter().map(notification_item).collect())
    }
}

/// Search rows carry the repository as an API URL; the payload wants
/// the `owner/name` form.
fn repo_full_name(repository_url: &str) -> String {
    repository_url
        .split_once("/repos/")
        .map_or_else(|| repository_url.to_owned(), |(_, name)| name.to_owned())
}

fn pull_request_from_item(item: SearchItem) -> PullRequest {
    PullRequest {
        id: item.id,
        title: item.title,
        url: item.html_url,
        state: item.state,
        created_at: item.created_at,
        updated_at: item.updated_at,
        author: item.user.map_or_else(String::new, |user| user.login),
        repository: repo_full_name(&item.repository_url),
    }
}

fn issue_item(item: SearchItem) -> Value {
    json!({
        "id": item.id,
        "title": item.title,
        "url": item.html_url,
        "state": item.state,
        "created_at": item.created_at,
        "updated_at": item.updated_at,
        "repository": repo_full_name(&item.repository_url),
        "labels": item.labels.into_iter().map(|label| label.name).collect::<Vec<_>>(),
    })
}

fn notification_item(thread: NotificationThread) -> Value {
    json!({
        "id": thread.id,
        "title": thread.subject.title,
        "type": thread.subject.kind,
        "reason": thread.reason,
        "updated_at": thread.updated_at,
        "repository": thread.repository.map(|repo| repo.full_name),
        "unread": thread.unread,
    })
}

/// Open pull requests involving the user
pub struct PullRequestsCapability {
    client: GithubClient,
}

impl PullRequestsCapability {
    #[must_use]
    pub const fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WidgetCapability for PullRequestsCapability {
    fn kind(&self) -> &'static str {
        widget_kinds::PULL_REQUESTS
    }

    async fn fetch(&self, integration: &Integration, params: &WidgetParams) -> AppResult<Value> {
        let prs = self
            .client
            .pull_requests(&integration.access_token, params.limit())
            .await?;
        Ok(json!({ "pull_requests": prs }))
    }
}

/// Open issues assigned to the user
pub struct AssignedIssuesCapability {
    client: GithubClient,
}

impl AssignedIssuesCapability {
    #[must_use]
    pub const fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WidgetCapability for AssignedIssuesCapability {
    fn kind(&self) -> &'static str {
        widget_kinds::ISSUES
    }

    async fn fetch(&self, integration: &Integration, params: &WidgetParams) -> AppResult<Value> {
        let issues = self
            .client
            .assigned_issues(&integration.access_token, params.limit())
            .await?;
        Ok(json!({ "issues": issues }))
    }
}

/// Unread notification threads
pub struct NotificationsCapability {
    client: GithubClient,
}

impl NotificationsCapability {
    #[must_use]
    pub const fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WidgetCapability for NotificationsCapability {
    fn kind(&self) -> &'static str {
        widget_kinds::NOTIFICATIONS
    }

    async fn fetch(&self, integration: &Integration, params: &WidgetParams) -> AppResult<Value> {
        let notifications = self
            .client
            .notifications(&integration.access_token, params.limit())
            .await?;
        Ok(json!({ "notifications": notifications }))
    }
}
