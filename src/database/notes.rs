// ABOUTME: Note storage queries
// ABOUTME: Pinned-first listings plus title and content search
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

use super::Database;
use crate::models::{Note, NoteCreate, NoteUpdate};
use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Create a note for the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_note(&self, user_id: i64, note: &NoteCreate) -> Result<Note> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO notes (user_id, title, content, is_pinned, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.is_pinned)
        .bind(now)
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        match self.get_note(user_id, id).await? {
            Some(created) => Ok(created),
            None => Err(anyhow::anyhow!("Note {id} missing after insert")),
        }
    }

    /// List the user's notes, pinned first, most recently updated next.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_notes(
        &self,
        user_id: i64,
        limit: i64,
        pinned_only: bool,
    ) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM notes
            WHERE user_id = ?1 AND (?2 = 0 OR is_pinned = 1)
            ORDER BY is_pinned DESC, updated_at DESC
            LIMIT ?3
            "#,
        )
        .bind(user_id)
        .bind(pinned_only)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_note).collect()
    }

    /// Fetch one of the user's notes by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_note(&self, user_id: i64, note_id: i64) -> Result<Option<Note>> {
        let row = sqlx::query("SELECT * FROM notes WHERE id = ?1 AND user_id = ?2")
            .bind(note_id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_note(&row)?)),
            None => Ok(None),
        }
    }

    /// Apply a partial update to one of the user's notes.
    ///
    /// Fields left unset in `update` keep their stored values. Returns `None`
    /// when the note does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn update_note(
        &self,
        user_id: i64,
        note_id: i64,
        update: &NoteUpdate,
    ) -> Result<Option<Note>> {
        let Some(existing) = self.get_note(user_id, note_id).await? else {
            return Ok(None);
        };

        let title = update.title.clone().unwrap_or(existing.title);
        let content = update.content.clone().or(existing.content);
        let is_pinned = update.is_pinned.unwrap_or(existing.is_pinned);

        sqlx::query(
            r#"
            UPDATE notes SET title = ?1, content = ?2, is_pinned = ?3, updated_at = ?4
            WHERE id = ?5 AND user_id = ?6
            "#,
        )
        .bind(&title)
        .bind(&content)
        .bind(is_pinned)
        .bind(Utc::now())
        .bind(note_id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        self.get_note(user_id, note_id).await
    }

    /// Delete one of the user's notes. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_note(&self, user_id: i64, note_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?1 AND user_id = ?2")
            .bind(note_id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Search the user's notes by title or content, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn search_notes(&self, user_id: i64, query: &str, limit: i64) -> Result<Vec<Note>> {
        // LIKE is case-insensitive for ASCII in SQLite
        let pattern = format!("%{query}%");
        let rows = sqlx::query(
            r#"
            SELECT * FROM notes
            WHERE user_id = ?1 AND (title LIKE ?2 OR content LIKE ?2)
            ORDER BY updated_at DESC
            LIMIT ?3
            "#,
        )
        .bind(user_id)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_note).collect()
    }
}

fn row_to_note(row: &SqliteRow) -> Result<Note> {
    Ok(Note {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        is_pinned: row.try_get("is_pinned")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
