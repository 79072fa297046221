// ABOUTME: Production server binary wiring configuration, storage, cache, and routes
// ABOUTME: Parses CLI overrides, initializes logging, and serves until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! # Synq Server Binary
//!
//! Starts the dashboard aggregation server: loads configuration from the
//! environment, runs database migrations, selects the cache backend, and
//! serves HTTP until interrupted.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use synq_server::cache::create_cache;
use synq_server::config::environment::ServerConfig;
use synq_server::database::Database;
use synq_server::logging::LoggingConfig;
use synq_server::server::{DashboardServer, ServerResources};
use tracing::info;

#[derive(Parser)]
#[command(name = "synq-server")]
#[command(about = "Synq - personal dashboard aggregation server")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Container entrypoints sometimes pass stray arguments; fall back to
    // defaults instead of refusing to start.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using default configuration");
            Args { http_port: None }
        }
    };

    LoggingConfig::from_env().init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    info!("Starting Synq dashboard server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    database.migrate().await?;
    info!("Database initialized: {}", config.database.url);

    let cache = create_cache(&config.cache.to_cache_config()).await;

    let resources = Arc::new(ServerResources::new(config, database, cache)?);
    DashboardServer::new(resources).run().await?;

    Ok(())
}
