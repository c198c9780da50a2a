// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Note service: the only caller of the persistence layer.
//!
//! Every operation runs inside a caller-supplied [`UnitOfWork`] and emits one
//! [`NoteEvent`] on success or on absence.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::Result;
use crate::events::NoteEvent;
use crate::model::{Note, NoteChanges, NoteCreate, Pagination};
use crate::persistence::{DEFAULT_OPERATION_TIMEOUT, NoteStore, UnitOfWork};

/// Orchestrates note persistence and domain events.
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    operation_timeout: Duration,
}

impl NoteService {
    /// Create a service over `store`.
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self {
            store,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Set the time budget for each persistence operation.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Start the unit of work for one request.
    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(self.store.clone(), self.operation_timeout)
    }

    /// Whether the backing store is reachable.
    pub async fn health_check(&self) -> bool {
        match self.store.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!(target: crate::events::TARGET, error = %e, "store health check failed");
                false
            }
        }
    }

    /// Validate and insert a note.
    pub async fn create_note(&self, uow: &mut UnitOfWork, payload: NoteCreate) -> Result<Note> {
        let new_note = payload.validate()?;
        let note = uow.insert(&new_note, Utc::now()).await?;

        NoteEvent::Created {
            note_id: note.id,
            title: &note.title,
        }
        .emit();

        Ok(note)
    }

    /// A page of notes in ascending id order; empty past the end.
    pub async fn list_notes(&self, uow: &mut UnitOfWork, page: Pagination) -> Result<Vec<Note>> {
        let notes = uow.list(page).await?;

        NoteEvent::Listed {
            count: notes.len(),
            offset: page.offset(),
            limit: page.limit(),
        }
        .emit();

        Ok(notes)
    }

    /// Look up a note; absence is a normal outcome.
    pub async fn get_note(&self, uow: &mut UnitOfWork, note_id: i64) -> Result<Option<Note>> {
        let note = uow.find_by_id(note_id).await?;

        match &note {
            Some(_) => NoteEvent::Found { note_id },
            None => NoteEvent::NotFound { note_id },
        }
        .emit();

        Ok(note)
    }

    /// Apply a validated patch to a note previously returned by [`Self::get_note`].
    ///
    /// The update is conditional on the row still existing; `None` means it was
    /// removed after the lookup.
    pub async fn update_note(
        &self,
        uow: &mut UnitOfWork,
        note: &Note,
        changes: NoteChanges,
    ) -> Result<Option<Note>> {
        let updated = uow.apply_patch(note.id, &changes, Utc::now()).await?;
        let changed_fields = changes.changed_fields();

        match &updated {
            Some(_) => NoteEvent::Updated {
                note_id: note.id,
                changed_fields: &changed_fields,
            },
            None => NoteEvent::NotFound { note_id: note.id },
        }
        .emit();

        Ok(updated)
    }

    /// Remove a note previously returned by [`Self::get_note`].
    ///
    /// Returns `false` when it was already gone.
    pub async fn delete_note(&self, uow: &mut UnitOfWork, note: &Note) -> Result<bool> {
        let removed = uow.remove(note.id).await?;

        if removed {
            NoteEvent::Deleted { note_id: note.id }.emit();
        } else {
            NoteEvent::NotFound { note_id: note.id }.emit();
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoteError;
    use crate::model::NoteUpdate;
    use crate::persistence::SqliteNoteStore;

    async fn test_service() -> NoteService {
        let store = SqliteNoteStore::connect("sqlite::memory:", 1)
            .await
            .expect("Failed to create in-memory SQLite store");
        NoteService::new(Arc::new(store))
    }

    fn payload(title: &str, content: &str) -> NoteCreate {
        NoteCreate::new(title, content)
    }

    async fn create(service: &NoteService, title: &str, content: &str) -> Note {
        let mut uow = service.begin();
        let note = service
            .create_note(&mut uow, payload(title, content))
            .await
            .unwrap();
        uow.commit().await.unwrap();
        note
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let service = test_service().await;
        let created = create(&service, "First", "Hello").await;

        assert!(created.id >= 1);
        assert_eq!(created.created_at, created.updated_at);

        let mut uow = service.begin();
        let fetched = service.get_note(&mut uow, created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload() {
        let service = test_service().await;
        let mut uow = service.begin();

        let err = service
            .create_note(&mut uow, payload("", "Hello"))
            .await
            .unwrap_err();

        match err {
            NoteError::Validation(errors) => assert_eq!(errors.fields(), vec!["title"]),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_pages_do_not_overlap() {
        let service = test_service().await;
        for i in 1..=5 {
            create(&service, &format!("t{i}"), "x").await;
        }

        let mut uow = service.begin();
        let first = service
            .list_notes(&mut uow, Pagination::new(Some(0), Some(2)).unwrap())
            .await
            .unwrap();
        let second = service
            .list_notes(&mut uow, Pagination::new(Some(2), Some(2)).unwrap())
            .await
            .unwrap();

        let ids: Vec<i64> = first.iter().chain(&second).map(|n| n.id).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(first[0].title, "t1");
        assert_eq!(second[0].title, "t3");
    }

    #[tokio::test]
    async fn test_update_keeps_unpatched_fields() {
        let service = test_service().await;
        let note = create(&service, "Old", "Old body").await;

        let patch: NoteUpdate = serde_json::from_str(r#"{"content": "New body"}"#).unwrap();
        let mut uow = service.begin();
        let updated = service
            .update_note(&mut uow, &note, patch.validate().unwrap())
            .await
            .unwrap()
            .expect("note should exist");
        uow.commit().await.unwrap();

        assert_eq!(updated.title, "Old");
        assert_eq!(updated.content, "New body");
        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(updated.created_at, note.created_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_after_concurrent_removal() {
        let service = test_service().await;
        let note = create(&service, "Old", "Old body").await;

        let mut uow = service.begin();
        assert!(service.delete_note(&mut uow, &note).await.unwrap());
        uow.commit().await.unwrap();

        let mut uow = service.begin();
        let changes = NoteChanges::default().with_title("New");
        assert!(
            service
                .update_note(&mut uow, &note, changes)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!service.delete_note(&mut uow, &note).await.unwrap());
    }

    #[tokio::test]
    async fn test_uncommitted_work_is_rolled_back() {
        let service = test_service().await;

        let id = {
            let mut uow = service.begin();
            service
                .create_note(&mut uow, payload("Draft", "never committed"))
                .await
                .unwrap()
                .id
        };

        let mut uow = service.begin();
        assert!(service.get_note(&mut uow, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        let service = test_service().await;
        assert!(service.health_check().await);
    }
}
