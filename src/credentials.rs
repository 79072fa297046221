// ABOUTME: Credential resolution for widget data requests
// ABOUTME: Looks up active integrations so dispatch can authenticate upstream calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use crate::database::Database;
use crate::models::Integration;
use anyhow::Result;

/// Resolves stored credentials for a user's connected services.
///
/// Missing and deactivated integrations are treated identically: no
/// credential, so the caller renders its "no active integration" payload.
#[derive(Clone)]
pub struct CredentialResolver {
    database: Database,
}

impl CredentialResolver {
    /// Create a resolver backed by `database`.
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// The active integration for `service_name`, if the user has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup query fails.
    pub async fn active(&self, user_id: i64, service_name: &str) -> Result<Option<Integration>> {
        self.database
            .get_active_integration(user_id, service_name)
            .await
    }

    /// Names of the services the user currently has active integrations for.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup query fails.
    pub async fn connected_services(&self, user_id: i64) -> Result<Vec<String>> {
        Ok(self
            .database
            .list_active_integrations(user_id)
            .await?
            .into_iter()
            .map(|integration| integration.service_name)
            .collect())
    }
}
