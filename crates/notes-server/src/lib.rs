// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Notes Server - HTTP surface for the notes service
//!
//! ```text
//! request ──► request_context ──► CatchPanicLayer ──► handlers ──► NoteService
//!             (X-Request-ID,       (panic → 500)       (one UnitOfWork
//!              access record)                           per request)
//! ```
//!
//! # Endpoints
//!
//! | Method | Path          | Success                     |
//! |--------|---------------|-----------------------------|
//! | GET    | `/`           | 200 greeting                |
//! | GET    | `/health`     | 200, or 503 if store is down|
//! | POST   | `/notes`      | 201 created note            |
//! | GET    | `/notes`      | 200 page of notes           |
//! | GET    | `/notes/{id}` | 200 note                    |
//! | PATCH  | `/notes/{id}` | 200 updated note            |
//! | DELETE | `/notes/{id}` | 204                         |
//!
//! Every response carries `X-Request-ID`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod telemetry;

pub use config::Config;
pub use server::router;

use notes_core::NoteService;

/// Shared state handed to every handler.
pub struct AppState {
    /// Note service over the configured store.
    pub notes: NoteService,
    /// Name greeted by `GET /`.
    pub app_name: String,
}

impl AppState {
    /// Create handler state.
    pub fn new(notes: NoteService, app_name: impl Into<String>) -> Self {
        Self {
            notes,
            app_name: app_name.into(),
        }
    }
}
