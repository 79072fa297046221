// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Services own the caching and invalidation rules for their domain
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! Domain service layer
//!
//! Business logic that route handlers delegate to. Services own the
//! cache-or-load decision for their reads and the invalidation rules for
//! their writes, so handlers stay thin.

/// Note CRUD with cached list and search reads
pub mod notes;

pub use notes::NotesService;
