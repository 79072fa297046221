// ABOUTME: Aggregate dashboard orchestrator fanning headline fetches across connected services
// ABOUTME: Branches are deadline-bounded and fault-isolated; partial results merge by category
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{WidgetDispatcher, WidgetRequest};
use crate::constants::{services, widget_kinds};
use crate::credentials::CredentialResolver;
use crate::errors::AppResult;
use crate::models::AggregateData;

/// Builds the consolidated dashboard view.
///
/// One branch runs per connected service, all concurrently. Each branch goes
/// through the dispatcher's headline requests, so aggregate fetches share
/// cache entries with widgets configured for the default limit. A branch
/// that fails or outlives the deadline leaves its categories empty; it never
/// suppresses the other branches.
pub struct DashboardAggregator {
    dispatcher: Arc<WidgetDispatcher>,
    credentials: CredentialResolver,
    deadline: Duration,
}

impl DashboardAggregator {
    #[must_use]
    pub fn new(
        dispatcher: Arc<WidgetDispatcher>,
        credentials: CredentialResolver,
        deadline: Duration,
    ) -> Self {
        Self {
            dispatcher,
            credentials,
            deadline,
        }
    }

    /// Aggregate headline data across the user's connected services.
    ///
    /// # Errors
    ///
    /// Returns an error only when the connected-services lookup fails;
    /// per-service fetch failures degrade to empty categories instead.
    pub async fn aggregate(&self, user_id: i64) -> AppResult<AggregateData> {
        let connected = self.credentials.connected_services(user_id).await?;
        debug!(user_id, services = ?connected, "aggregating dashboard data");

        let (github, google, jira) = tokio::join!(
            self.branch(&connected, services::GITHUB, user_id),
            self.branch(&connected, services::GOOGLE, user_id),
            self.branch(&connected, services::JIRA, user_id),
        );

        let mut data = AggregateData::default();
        for fragment in [github, google, jira].into_iter().flatten() {
            data.calendar_events.extend(fragment.calendar_events);
            data.tasks.extend(fragment.tasks);
            data.pull_requests.extend(fragment.pull_requests);
            data.tickets.extend(fragment.tickets);
            data.emails.extend(fragment.emails);
        }
        Ok(data)
    }

    /// One deadline-bounded branch; `None` when the service is not connected
    async fn branch(
        &self,
        connected: &[String],
        service: &'static str,
        user_id: i64,
    ) -> Option<AggregateData> {
        if !connected.iter().any(|name| name == service) {
            return None;
        }
        match tokio::time::timeout(self.deadline, self.fetch_fragment(service, user_id)).await {
            Ok(fragment) => Some(fragment),
            Err(_) => {
                warn!(
                    service,
                    user_id,
                    deadline_secs = self.deadline.as_secs(),
                    "aggregate branch timed out"
                );
                Some(AggregateData::default())
            }
        }
    }

    async fn fetch_fragment(&self, service: &'static str, user_id: i64) -> AggregateData {
        let mut fragment = AggregateData::default();
        match service {
            services::GITHUB => {
                let payload = self
                    .dispatcher
                    .widget_data(&WidgetRequest::headline(
                        user_id,
                        services::GITHUB,
                        widget_kinds::PULL_REQUESTS,
                    ))
                    .await;
                fragment.pull_requests = payload_items(&payload, widget_kinds::PULL_REQUESTS);
            }
            services::GOOGLE => {
                let calendar_request =
                    WidgetRequest::headline(user_id, services::GOOGLE, widget_kinds::CALENDAR);
                let tasks_request =
                    WidgetRequest::headline(user_id, services::GOOGLE, widget_kinds::TASKS);
                let emails_request =
                    WidgetRequest::headline(user_id, services::GOOGLE, widget_kinds::EMAILS);
                let (calendar, tasks, emails) = tokio::join!(
                    self.dispatcher.widget_data(&calendar_request),
                    self.dispatcher.widget_data(&tasks_request),
                    self.dispatcher.widget_data(&emails_request),
                );
                // calendar payloads key their items as "events"
                fragment.calendar_events = payload_items(&calendar, "events");
                fragment.tasks = payload_items(&tasks, widget_kinds::TASKS);
                fragment.emails = payload_items(&emails, widget_kinds::EMAILS);
            }
            services::JIRA => {
                let payload = self
                    .dispatcher
                    .widget_data(&WidgetRequest::headline(
                        user_id,
                        services::JIRA,
                        widget_kinds::TICKETS,
                    ))
                    .await;
                fragment.tickets = payload_items(&payload, widget_kinds::TICKETS);
            }
            _ => {}
        }
        fragment
    }
}

/// Items under `key`, or empty when the payload is an error or malformed
fn payload_items(payload: &Value, key: &str) -> Vec<Value> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_items_extracts_arrays() {
        let payload = json!({ "tickets": [{ "key": "SYNQ-1" }, { "key": "SYNQ-2" }] });
        assert_eq!(payload_items(&payload, "tickets").len(), 2);
    }

    #[test]
    fn error_payloads_yield_no_items() {
        let payload = json!({ "error": "No active jira integration found" });
        assert!(payload_items(&payload, "tickets").is_empty());
    }

    #[test]
    fn non_array_values_yield_no_items() {
        let payload = json!({ "tickets": "oops" });
        assert!(payload_items(&payload, "tickets").is_empty());
    }
}
