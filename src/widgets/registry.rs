// ABOUTME: Capability registry mapping (service_name, widget_type) pairs to fetch capabilities
// ABOUTME: Wired once at startup; unknown pairs are an expected, cacheable dispatch outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;

use super::WidgetCapability;
use crate::config::OAuthConfig;
use crate::constants::services;
use crate::providers::github::{
    AssignedIssuesCapability, NotificationsCapability, PullRequestsCapability,
};
use crate::providers::google::{CalendarCapability, EmailsCapability, TasksCapability};
use crate::providers::jira::TicketsCapability;
use crate::providers::{GithubClient, GoogleClient, JiraClient};

fn registry_key(service_name: &str, widget_type: &str) -> String {
    format!("{service_name}:{widget_type}")
}

/// Lookup table from `(service_name, widget_type)` to a fetch capability.
///
/// Registration happens once at startup; dispatch only reads. Adding a
/// provider means registering its capabilities here, the dispatcher never
/// changes.
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn WidgetCapability>>,
}

impl CapabilityRegistry {
    /// Empty registry; tests register fakes directly
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// Registry wired with the production capabilities of every
    /// connectable service
    #[must_use]
    pub fn standard(http: &Client, oauth: &OAuthConfig) -> Self {
        let github = GithubClient::new(http.clone());
        let google = GoogleClient::new(http.clone(), oauth.google.clone());
        let jira = JiraClient::new(http.clone());

        let mut registry = Self::new();
        registry.register(
            services::GITHUB,
            Arc::new(PullRequestsCapability::new(github.clone())),
        );
        registry.register(
            services::GITHUB,
            Arc::new(AssignedIssuesCapability::new(github.clone())),
        );
        registry.register(
            services::GITHUB,
            Arc::new(NotificationsCapability::new(github)),
        );
        registry.register(
            services::GOOGLE,
            Arc::new(CalendarCapability::new(google.clone())),
        );
        registry.register(
            services::GOOGLE,
            Arc::new(TasksCapability::new(google.clone())),
        );
        registry.register(services::GOOGLE, Arc::new(EmailsCapability::new(google)));
        registry.register(services::JIRA, Arc::new(TicketsCapability::new(jira)));
        registry
    }

    /// Register a capability under its own kind for the given service
    pub fn register(&mut self, service_name: &str, capability: Arc<dyn WidgetCapability>) {
        self.capabilities
            .insert(registry_key(service_name, capability.kind()), capability);
    }

    /// Resolve the capability for a `(service_name, widget_type)` pair
    #[must_use]
    pub fn resolve(
        &self,
        service_name: &str,
        widget_type: &str,
    ) -> Option<Arc<dyn WidgetCapability>> {
        self.capabilities
            .get(&registry_key(service_name, widget_type))
            .cloned()
    }

    /// Number of registered capabilities
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OAuthProviderConfig;
    use crate::constants::widget_kinds;

    fn oauth_config() -> OAuthConfig {
        let provider = OAuthProviderConfig {
            client_id: None,
            client_secret: None,
            redirect_uri: String::new(),
        };
        OAuthConfig {
            github: provider.clone(),
            google: provider.clone(),
            jira: provider,
        }
    }

    #[test]
    fn standard_registry_serves_every_widget_kind() {
        let registry = CapabilityRegistry::standard(&Client::new(), &oauth_config());

        let pairs = [
            (services::GITHUB, widget_kinds::PULL_REQUESTS),
            (services::GITHUB, widget_kinds::ISSUES),
            (services::GITHUB, widget_kinds::NOTIFICATIONS),
            (services::GOOGLE, widget_kinds::CALENDAR),
            (services::GOOGLE, widget_kinds::TASKS),
            (services::GOOGLE, widget_kinds::EMAILS),
            (services::JIRA, widget_kinds::TICKETS),
        ];
        for (service, kind) in pairs {
            let capability = registry.resolve(service, kind);
            assert!(capability.is_some(), "missing capability {service}:{kind}");
            assert_eq!(capability.unwrap().kind(), kind);
        }
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn unknown_pairs_resolve_to_none() {
        let registry = CapabilityRegistry::standard(&Client::new(), &oauth_config());

        assert!(registry.resolve(services::GITHUB, widget_kinds::CALENDAR).is_none());
        assert!(registry.resolve("linear", widget_kinds::TICKETS).is_none());
    }
}
