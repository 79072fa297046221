// ABOUTME: Atlassian Jira cloud client plus the tickets capability
// ABOUTME: Resolves the cloud site and account id before running the assignee JQL search
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
use crate::models::{Integration, Ticket};
use crate::widgets::{WidgetCapability, WidgetParams};

/// Site entry from the accessible-resources endpoint
#[derive(Debug, Deserialize)]
struct CloudResource {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JiraMyself {
    #[serde(rename = "accountId")]
    account_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    issues: Vec<IssueItem>,
}

#[derive(Debug, Deserialize)]
struct IssueItem {
    id: String,
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    summary: Option<String>,
    status: Option<NamedField>,
    priority: Option<NamedField>,
    assignee: Option<AssigneeField>,
    created: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedField {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssigneeField {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

/// Client for the Atlassian cloud gateway
#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
}

impl JiraClient {
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: api::ATLASSIAN_BASE_URL.to_owned(),
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
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                services::JIRA,
                format!("Jira API request failed with status {status}: {body}"),
            ));
        }

        Ok(response.json().await?)
    }

    /// Tickets assigned to the token's user on their first accessible site.
    ///
    /// A token with no accessible sites yields an empty list rather than an
    /// error: the integration is valid, there is just nothing to show.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three requests fails.
    pub async fn assigned_tickets(
        &self,
        access_token: &str,
        limit: usize,
    ) -> AppResult<Vec<Ticket>> {
        let resources: Vec<CloudResource> = self
            .api_get(access_token, "oauth/token/accessible-resources", &[])
            .await?;
        let Some(site) = resources.first() else {
            return Ok(Vec::new());
        };

        let myself: JiraMyself = self
            .api_get(
                access_token,
                &format!("ex/jira/{}/rest/api/3/myself", site.id),
                &[],
            )
            .await?;

        let results: SearchResults = self
            .api_get(
                access_token,
                &format!("ex/jira/{}/rest/api/3/search", site.id),
                &[
                    ("jql", format!("assignee = \"{}\"", myself.account_id)),
                    ("maxResults", limit.to_string()),
                    (
                        "fields",
                        "id,key,summary,status,priority,assignee,created,updated".to_owned(),
                    ),
                ],
            )
            .await?;

        Ok(results.issues.into_iter().map(ticket_from_issue).collect())
    }
}

fn ticket_from_issue(issue: IssueItem) -> Ticket {
    let fields = issue.fields;
    Ticket {
        id: issue.id,
        key: issue.key,
        title: fields.summary.unwrap_or_default(),
        status: fields
            .status
            .and_then(|status| status.name)
            .unwrap_or_else(|| "Unknown".to_owned()),
        priority: fields
            .priority
            .and_then(|priority| priority.name)
            .unwrap_or_else(|| "None".to_owned()),
        assignee: fields.assignee.and_then(|assignee| assignee.display_name),
        created_at: parse_timestamp_or_epoch(fields.created.as_deref()),
        updated_at: parse_timestamp_or_epoch(fields.updated.as_deref()),
    }
}

/// Jira emits `2025-05-01T10:00:00.000+0000`; cloud sites occasionally send
/// RFC 3339 instead.
fn parse_jira_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(stamp))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Issues missing timestamps sort to the epoch
fn parse_timestamp_or_epoch(stamp: Option<&str>) -> DateTime<Utc> {
    stamp
        .and_then(parse_jira_timestamp)
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Tickets assigned to the user
pub struct TicketsCapability {
    client: JiraClient,
}

impl TicketsCapability {
    #[must_use]
    pub const fn new(client: JiraClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WidgetCapability for TicketsCapability {
    fn kind(&self) -> &'static str {
        widget_kinds::TICKETS
    }

    async fn fetch(&self, integration: &Integration, params: &WidgetParams) -> AppResult<Value> {
        let tickets = self
            .client
            .assigned_tickets(&integration.access_token, params.limit())
            .await?;
        Ok(json!({ "tickets": tickets }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jira_offset_format_parses() {
        let parsed = parse_jira_timestamp("2025-05-01T10:00:00.000+0000").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-05-01T10:00:00+00:00");
    }

    #[test]
    fn rfc3339_fallback_parses() {
        let parsed = parse_jira_timestamp("2025-05-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-05-01T08:00:00+00:00");
    }

    #[test]
    fn issue_maps_to_ticket_with_defaults() {
        let issue: IssueItem = serde_json::from_value(json!({
            "id": "10001",
            "key": "SYNQ-12",
            "fields": {
                "summary": "Widget cache misses spike",
                "status": { "name": "In Progress" },
                "priority": null,
                "assignee": { "displayName": "Dana" },
                "created": "2025-05-01T10:00:00.000+0000",
                "updated": "2025-05-02T10:00:00.000+0000"
            }
        }))
        .unwrap();

        let ticket = ticket_from_issue(issue);
        assert_eq!(ticket.key, "SYNQ-12");
        assert_eq!(ticket.status, "In Progress");
        assert_eq!(ticket.priority, "None");
        assert_eq!(ticket.assignee.as_deref(), Some("Dana"));
    }

    #[test]
    fn issue_with_empty_fields_uses_sentinels() {
        let issue: IssueItem = serde_json::from_value(json!({
            "id": "10002",
            "key": "SYNQ-13",
            "fields": {}
        }))
        .unwrap();

        let ticket = ticket_from_issue(issue);
        assert_eq!(ticket.title, "");
        assert_eq!(ticket.status, "Unknown");
        assert_eq!(ticket.created_at, DateTime::UNIX_EPOCH);
    }
}
