// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Schema for the `notes` table, one migration set per backend.
//!
//! [`crate::persistence::connect`] and the store constructors apply these before
//! the first request is served, so handlers never create tables on the fly. The
//! SQLite set stores timestamps as RFC 3339 text; the PostgreSQL set uses
//! `TIMESTAMPTZ` and also checks `created_at <= updated_at`. Field lengths are
//! enforced by request validation only.
//!
//! ```ignore
//! let pool = sqlx::SqlitePool::connect("sqlite:notes.db?mode=rwc").await?;
//! notes_core::migrations::run_sqlite(&pool).await?;
//! let store = notes_core::persistence::SqliteNoteStore::new(pool);
//! ```

use sqlx::migrate::MigrateError;

/// Note schema for PostgreSQL.
pub static POSTGRES: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/postgresql");

/// Note schema for SQLite.
pub static SQLITE: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

/// Bring a PostgreSQL database up to the current note schema.
pub async fn run_postgres(pool: &sqlx::PgPool) -> Result<(), MigrateError> {
    POSTGRES.run(pool).await
}

/// Bring a SQLite database up to the current note schema. Re-running is a no-op.
pub async fn run_sqlite(pool: &sqlx::SqlitePool) -> Result<(), MigrateError> {
    SQLITE.run(pool).await
}
