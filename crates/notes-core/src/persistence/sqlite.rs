// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed persistence implementation.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::{NoteError, Result};
use crate::migrations;
use crate::model::{NewNote, Note, NoteChanges, Pagination};

use super::{NoteStore, NoteTransaction};

/// SQLite-backed note store.
#[derive(Clone)]
pub struct SqliteNoteStore {
    pool: SqlitePool,
}

impl SqliteNoteStore {
    /// Create a store from an existing, already-migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and run migrations.
    ///
    /// In-memory databases are private to a connection, so they are always opened
    /// with a single-connection pool.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let max_connections = if url.contains(":memory:") {
            1
        } else {
            max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(NoteError::database("connect"))?;

        migrations::run_sqlite(&pool).await?;

        Ok(Self { pool })
    }

    /// Create and initialize a store from a file path.
    ///
    /// Creates parent directories and the database file if they don't exist.
    pub async fn from_path(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| NoteError::Database {
                operation: "create_dir",
                source: sqlx::Error::Io(e),
            })?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        Self::connect(&url, max_connections).await
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl NoteStore for SqliteNoteStore {
    async fn begin(&self) -> Result<Box<dyn NoteTransaction>> {
        // Take the write lock up front: a deferred transaction that reads and then
        // writes fails with SQLITE_BUSY instead of waiting when another writer is active.
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(NoteError::database("begin"))?;
        Ok(Box::new(SqliteTransaction { tx }))
    }

    async fn health_check(&self) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(NoteError::database("health_check"))?;
        Ok(row.0 == 1)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait::async_trait]
impl NoteTransaction for SqliteTransaction {
    async fn insert(&mut self, note: &NewNote, now: DateTime<Utc>) -> Result<Note> {
        let record = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (title, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            RETURNING id, title, content, created_at, updated_at
            "#,
        )
        .bind(note.title())
        .bind(note.content())
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(NoteError::database("insert"))?;

        Ok(record)
    }

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Note>> {
        let record = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, created_at, updated_at
            FROM notes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(NoteError::database("find_by_id"))?;

        Ok(record)
    }

    async fn list(&mut self, page: Pagination) -> Result<Vec<Note>> {
        let records = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, created_at, updated_at
            FROM notes
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(NoteError::database("list"))?;

        Ok(records)
    }

    async fn apply_patch(
        &mut self,
        id: i64,
        changes: &NoteChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Note>> {
        let record = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
            SET title = COALESCE(?1, title),
                content = COALESCE(?2, content),
                updated_at = MAX(?3, created_at)
            WHERE id = ?4
            RETURNING id, title, content, created_at, updated_at
            "#,
        )
        .bind(changes.title())
        .bind(changes.content())
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(NoteError::database("apply_patch"))?;

        Ok(record)
    }

    async fn remove(&mut self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(NoteError::database("remove"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(NoteError::database("commit"))
    }
}
