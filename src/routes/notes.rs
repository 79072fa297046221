// ABOUTME: Note CRUD and search route handlers backed by the notes service
// ABOUTME: List and search reads come from the cache; mutations invalidate it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::constants::limits;
use crate::errors::AppError;
use crate::models::{NoteCreate, NoteUpdate};
use crate::server::ServerResources;

/// Query parameters for `GET /notes`
#[derive(Debug, Deserialize)]
pub struct ListNotesQuery {
    pub limit: Option<i64>,
    pub pinned_only: Option<bool>,
}

/// Query parameters for `GET /notes/search/:query`
#[derive(Debug, Deserialize)]
pub struct SearchNotesQuery {
    pub limit: Option<i64>,
}

/// Note routes implementation
pub struct NotesRoutes;

impl NotesRoutes {
    /// Create all note routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/notes", post(Self::handle_create))
            .route("/notes", get(Self::handle_list))
            .route("/notes/:note_id", get(Self::handle_get))
            .route("/notes/:note_id", put(Self::handle_update))
            .route("/notes/:note_id", delete(Self::handle_delete))
            .route("/notes/search/:query", get(Self::handle_search))
            .with_state(resources)
    }

    /// Create a note
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(payload): Json<NoteCreate>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let note = resources.notes.create(user.id, &payload).await?;
        Ok((StatusCode::OK, Json(note)).into_response())
    }

    /// List notes, newest first, optionally pinned only
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListNotesQuery>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let limit = query.limit.unwrap_or(limits::DEFAULT_NOTES_LIMIT);
        let pinned_only = query.pinned_only.unwrap_or(false);
        let notes = resources.notes.list(user.id, limit, pinned_only).await?;
        Ok((StatusCode::OK, Json(notes)).into_response())
    }

    /// Fetch one note
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(note_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let note = resources.notes.get(user.id, note_id).await?;
        Ok((StatusCode::OK, Json(note)).into_response())
    }

    /// Update a note; absent body fields keep their stored value
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(note_id): Path<i64>,
        Json(payload): Json<NoteUpdate>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let note = resources.notes.update(user.id, note_id, &payload).await?;
        Ok((StatusCode::OK, Json(note)).into_response())
    }

    /// Delete a note
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(note_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let confirmation = resources.notes.delete(user.id, note_id).await?;
        Ok((StatusCode::OK, Json(confirmation)).into_response())
    }

    /// Full-text search across note titles and content
    async fn handle_search(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(query): Path<String>,
        Query(params): Query<SearchNotesQuery>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources).await?;
        let limit = params.limit.unwrap_or(limits::DEFAULT_NOTES_LIMIT);
        let notes = resources.notes.search(user.id, &query, limit).await?;
        Ok((StatusCode::OK, Json(notes)).into_response())
    }
}
