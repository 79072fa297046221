// ABOUTME: Configuration modules for deployment-specific settings
// ABOUTME: Environment variable parsing with typed sections and validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

pub mod environment;

pub use environment::{
    AggregationConfig, CacheSettings, DatabaseConfig, OAuthConfig, OAuthProviderConfig,
    ServerConfig,
};
