// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Notes Core - entity model, persistence, and note service
//!
//! This crate holds everything below the HTTP surface of the notes service:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        notes-server          │  HTTP surface, access-log middleware
//! └──────────────┬───────────────┘
//!                │ NoteService + UnitOfWork (one per request)
//!                ▼
//! ┌──────────────────────────────┐
//! │         NoteService          │  validation, domain events
//! └──────────────┬───────────────┘
//!                │ NoteTransaction
//!                ▼
//! ┌──────────────────────────────┐
//! │   SQLite  |  PostgreSQL      │  one `notes` table
//! └──────────────────────────────┘
//! ```
//!
//! # Unit of Work
//!
//! All persistence calls made for one request share a single transaction. It is
//! opened lazily on the first call, committed explicitly, and rolled back if the
//! [`persistence::UnitOfWork`] is dropped first. Each call is bounded by a timeout.
//!
//! # Modules
//!
//! - [`context`]: Task-local request context (correlation id, route)
//! - [`error`]: Error types
//! - [`events`]: Structured domain events
//! - [`migrations`]: Embedded schema migrations
//! - [`model`]: Note entity and validated inputs
//! - [`persistence`]: Store traits and SQLite/PostgreSQL backends
//! - [`service`]: Note service

#![deny(missing_docs)]

/// Task-local request context read by every log record.
pub mod context;

/// Error types for note operations.
pub mod error;

/// Structured domain events emitted by the note service.
pub mod events;

/// Embedded SQLite and PostgreSQL migrations.
pub mod migrations;

/// Note entity, create/update payloads, and pagination.
pub mod model;

/// Store and transaction traits with SQLite and PostgreSQL backends.
pub mod persistence;

/// Note service orchestrating persistence and events.
pub mod service;

pub use error::{NoteError, Result, ValidationErrors};
pub use model::{FieldInput, Note, NoteChanges, NoteCreate, NoteUpdate, Pagination};
pub use persistence::{NoteStore, UnitOfWork};
pub use service::NoteService;
