// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Notes Server - REST API for notes
//!
//! Serves create/read/update/delete/list on `/notes`, backed by SQLite or PostgreSQL,
//! with one JSON access record per request correlated by `X-Request-ID`.

use std::sync::Arc;
use tracing::{info, warn};

use notes_core::{NoteService, NoteStore};
use notes_server::config::Config;
use notes_server::{AppState, server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present, before reading any configuration
    let dotenv = dotenvy::dotenv();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    telemetry::init_subscriber(config.log_format, config.default_log_level())?;

    if let Err(e) = dotenv {
        warn!("No .env file loaded: {}", e);
    }

    info!(
        app_name = %config.app_name,
        http_addr = %config.http_addr,
        db_max_connections = config.db_max_connections,
        db_timeout_ms = config.db_timeout.as_millis() as u64,
        "Starting Notes Server"
    );

    // Connect and apply embedded migrations
    let store = notes_core::persistence::connect(&config.database_url, config.db_max_connections).await?;
    info!(backend = store.backend(), "Connected to database");

    let notes = NoteService::new(store.clone()).with_operation_timeout(config.db_timeout);
    let state = Arc::new(AppState::new(notes, config.app_name.clone()));

    server::serve(config.http_addr, server::router(state), shutdown_signal()).await?;

    store.close().await;
    info!("Notes Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
