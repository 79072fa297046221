// ABOUTME: Upstream provider API clients and their widget capability implementations
// ABOUTME: GitHub, Google (calendar, tasks, gmail), and Atlassian Jira over reqwest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! Provider clients
//!
//! Each provider module exposes a thin reqwest-backed client plus the
//! [`WidgetCapability`](crate::widgets::WidgetCapability) implementations
//! served from it. Clients are stateless with respect to users: the access
//! token travels with every call, so one client instance serves all tenants.

pub mod github;
pub mod google;
pub mod jira;

pub use github::GithubClient;
pub use google::GoogleClient;
pub use jira::JiraClient;
