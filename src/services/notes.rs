// ABOUTME: Note business logic layered over the database with response caching
// ABOUTME: List and search reads are cached, every mutation invalidates the notes namespace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::cache::{CacheProvider, Fingerprint};
use crate::constants::services;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{Note, NoteCreate, NoteUpdate};

/// Note operations with cached read paths.
///
/// Listings and searches are cached under the user's notes namespace so
/// widgets re-rendering in quick succession do not repeat the query. Every
/// mutation invalidates that namespace, keeping readers at most one write
/// behind.
#[derive(Clone)]
pub struct NotesService {
    database: Database,
    cache: Arc<dyn CacheProvider>,
    ttl: Duration,
}

impl NotesService {
    #[must_use]
    pub fn new(database: Database, cache: Arc<dyn CacheProvider>, ttl: Duration) -> Self {
        Self {
            database,
            cache,
            ttl,
        }
    }

    /// List the user's notes, pinned first, as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, user_id: i64, limit: i64, pinned_only: bool) -> AppResult<Value> {
        let fingerprint = Fingerprint::for_request(
            user_id,
            services::NOTES,
            "list",
            Some(&json!({"limit": limit, "pinned_only": pinned_only})),
        );
        if let Some(cached) = self.cached(&fingerprint).await {
            return Ok(cached);
        }

        let notes = self
            .database
            .list_notes(user_id, limit, pinned_only)
            .await?;
        self.store(&fingerprint, serde_json::to_value(notes)?).await
    }

    /// Search the user's notes by title or content, as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search(&self, user_id: i64, query: &str, limit: i64) -> AppResult<Value> {
        let fingerprint = Fingerprint::for_request(
            user_id,
            services::NOTES,
            "search",
            Some(&json!({"limit": limit, "query": query})),
        );
        if let Some(cached) = self.cached(&fingerprint).await {
            return Ok(cached);
        }

        let notes = self.database.search_notes(user_id, query, limit).await?;
        self.store(&fingerprint, serde_json::to_value(notes)?).await
    }

    /// Fetch one of the user's notes.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the note does not exist, or an error if
    /// the query fails.
    pub async fn get(&self, user_id: i64, note_id: i64) -> AppResult<Note> {
        self.database
            .get_note(user_id, note_id)
            .await?
            .ok_or_else(|| AppError::not_found("Note"))
    }

    /// Create a note.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, user_id: i64, note: &NoteCreate) -> AppResult<Note> {
        let created = self.database.create_note(user_id, note).await?;
        self.invalidate(user_id).await;
        Ok(created)
    }

    /// Apply a partial update to a note.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the note does not exist, or an error if
    /// the update fails.
    pub async fn update(
        &self,
        user_id: i64,
        note_id: i64,
        update: &NoteUpdate,
    ) -> AppResult<Note> {
        let updated = self
            .database
            .update_note(user_id, note_id, update)
            .await?
            .ok_or_else(|| AppError::not_found("Note"))?;
        self.invalidate(user_id).await;
        Ok(updated)
    }

    /// Delete a note.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the note does not exist, or an error if
    /// the delete fails.
    pub async fn delete(&self, user_id: i64, note_id: i64) -> AppResult<Value> {
        if !self.database.delete_note(user_id, note_id).await? {
            return Err(AppError::not_found("Note"));
        }
        self.invalidate(user_id).await;
        Ok(json!({"message": "Note deleted successfully"}))
    }

    // Cache read failures fall through to the database.
    async fn cached(&self, fingerprint: &Fingerprint) -> Option<Value> {
        match self.cache.get(fingerprint).await {
            Ok(Some(value)) => {
                debug!(key = fingerprint.as_str(), "notes cache hit");
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key = fingerprint.as_str(), "notes cache read failed: {e}");
                None
            }
        }
    }

    async fn store(&self, fingerprint: &Fingerprint, payload: Value) -> AppResult<Value> {
        if let Err(e) = self.cache.set(fingerprint, &payload, self.ttl).await {
            warn!(key = fingerprint.as_str(), "notes cache write failed: {e}");
        }
        Ok(payload)
    }

    async fn invalidate(&self, user_id: i64) {
        let pattern = Fingerprint::service_pattern(user_id, services::NOTES);
        match self.cache.invalidate_pattern(&pattern).await {
            Ok(count) => debug!(pattern = pattern.as_str(), count, "notes cache invalidated"),
            Err(e) => warn!(
                pattern = pattern.as_str(),
                "notes cache invalidation failed: {e}"
            ),
        }
    }
}
