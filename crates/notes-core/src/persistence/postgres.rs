// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed persistence implementation.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{NoteError, Result};
use crate::migrations;
use crate::model::{NewNote, Note, NoteChanges, Pagination};

use super::{NoteStore, NoteTransaction};

/// PostgreSQL-backed note store.
#[derive(Clone)]
pub struct PostgresNoteStore {
    pool: PgPool,
}

impl PostgresNoteStore {
    /// Create a store from an existing, already-migrated pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and run migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(NoteError::database("connect"))?;

        migrations::run_postgres(&pool).await?;

        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl NoteStore for PostgresNoteStore {
    async fn begin(&self) -> Result<Box<dyn NoteTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(NoteError::database("begin"))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn health_check(&self) -> Result<bool> {
        let row: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(NoteError::database("health_check"))?;
        Ok(row.0 == 1)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl NoteTransaction for PostgresTransaction {
    async fn insert(&mut self, note: &NewNote, now: DateTime<Utc>) -> Result<Note> {
        let record = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
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
            WHERE id = $1
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
            LIMIT $1 OFFSET $2
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
            SET title = COALESCE($1, title),
                content = COALESCE($2, content),
                updated_at = GREATEST($3, created_at)
            WHERE id = $4
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
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
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
