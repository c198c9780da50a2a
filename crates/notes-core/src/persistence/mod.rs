// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Persistence interfaces and backends for notes-core.
//!
//! A [`NoteStore`] opens backend transactions; a [`UnitOfWork`] wraps one of them for
//! the lifetime of a single request and bounds every call with a timeout.

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresNoteStore;
pub use self::sqlite::SqliteNoteStore;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{NoteError, Result};
use crate::model::{NewNote, Note, NoteChanges, Pagination};

/// Default time budget for a single persistence operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of transactions against the notes table.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Acquire a connection and begin a transaction on it.
    async fn begin(&self) -> Result<Box<dyn NoteTransaction>>;

    /// Whether the store answers a trivial query.
    async fn health_check(&self) -> Result<bool>;

    /// Backend name, for logs.
    fn backend(&self) -> &'static str;

    /// Close the pool, waiting for checked-out connections to return.
    async fn close(&self);
}

/// One open transaction. Dropping it without [`NoteTransaction::commit`] rolls back.
#[async_trait]
pub trait NoteTransaction: Send {
    /// Insert a note with both timestamps set to `now`; the generated id is visible
    /// in the returned record before commit.
    async fn insert(&mut self, note: &NewNote, now: DateTime<Utc>) -> Result<Note>;

    /// Point lookup.
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Note>>;

    /// Notes ordered by ascending id.
    async fn list(&mut self, page: Pagination) -> Result<Vec<Note>>;

    /// Overwrite the present fields and refresh `updated_at` in a single statement.
    /// Returns `None` when no row has the id.
    async fn apply_patch(
        &mut self,
        id: i64,
        changes: &NoteChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Note>>;

    /// Delete by id. Returns whether a row was removed.
    async fn remove(&mut self, id: i64) -> Result<bool>;

    /// Make every change in this transaction visible.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Run `future`, failing with [`NoteError::Timeout`] if it outlives `after`.
pub async fn bounded<T, F>(operation: &'static str, after: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| NoteError::Timeout { operation, after })?
}

/// All persistence calls made on behalf of one request.
///
/// The transaction is opened on first use, so requests that fail validation never
/// touch the store. Dropping a unit of work without committing rolls back every
/// change and returns the connection to the pool.
pub struct UnitOfWork {
    store: Arc<dyn NoteStore>,
    tx: Option<Box<dyn NoteTransaction>>,
    timeout: Duration,
}

impl UnitOfWork {
    /// Create a unit of work against `store`.
    pub fn new(store: Arc<dyn NoteStore>, timeout: Duration) -> Self {
        Self {
            store,
            tx: None,
            timeout,
        }
    }

    async fn tx(&mut self) -> Result<&mut Box<dyn NoteTransaction>> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => bounded("begin", self.timeout, self.store.begin()).await?,
        };
        Ok(self.tx.insert(tx))
    }

    /// See [`NoteTransaction::insert`].
    pub async fn insert(&mut self, note: &NewNote, now: DateTime<Utc>) -> Result<Note> {
        let timeout = self.timeout;
        let tx = self.tx().await?;
        bounded("insert", timeout, tx.insert(note, now)).await
    }

    /// See [`NoteTransaction::find_by_id`].
    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Note>> {
        let timeout = self.timeout;
        let tx = self.tx().await?;
        bounded("find_by_id", timeout, tx.find_by_id(id)).await
    }

    /// See [`NoteTransaction::list`].
    pub async fn list(&mut self, page: Pagination) -> Result<Vec<Note>> {
        let timeout = self.timeout;
        let tx = self.tx().await?;
        bounded("list", timeout, tx.list(page)).await
    }

    /// See [`NoteTransaction::apply_patch`].
    pub async fn apply_patch(
        &mut self,
        id: i64,
        changes: &NoteChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Note>> {
        let timeout = self.timeout;
        let tx = self.tx().await?;
        bounded("apply_patch", timeout, tx.apply_patch(id, changes, now)).await
    }

    /// See [`NoteTransaction::remove`].
    pub async fn remove(&mut self, id: i64) -> Result<bool> {
        let timeout = self.timeout;
        let tx = self.tx().await?;
        bounded("remove", timeout, tx.remove(id)).await
    }

    /// Commit. A unit of work that never touched the store commits trivially.
    pub async fn commit(self) -> Result<()> {
        match self.tx {
            Some(tx) => bounded("commit", self.timeout, tx.commit()).await,
            None => Ok(()),
        }
    }
}

/// Connect to the store named by `database_url` and apply embedded migrations.
///
/// `sqlite:` URLs select [`SqliteNoteStore`]; `postgres://` and `postgresql://` select
/// [`PostgresNoteStore`].
pub async fn connect(database_url: &str, max_connections: u32) -> Result<Arc<dyn NoteStore>> {
    if database_url.starts_with("sqlite:") {
        let store = SqliteNoteStore::connect(database_url, max_connections).await?;
        Ok(Arc::new(store))
    } else {
        let store = PostgresNoteStore::connect(database_url, max_connections).await?;
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_through_result() {
        let value = bounded("noop", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let err = bounded(
            "insert",
            Duration::from_millis(50),
            std::future::pending::<Result<()>>(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            NoteError::Timeout {
                operation: "insert",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_untouched_unit_of_work_commits_without_store() {
        let store: Arc<dyn NoteStore> = Arc::new(
            SqliteNoteStore::connect("sqlite::memory:", 1)
                .await
                .expect("in-memory store"),
        );
        let uow = UnitOfWork::new(store, DEFAULT_OPERATION_TIMEOUT);
        uow.commit().await.unwrap();
    }
}
