// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Domain events emitted by the note service.
//!
//! Each variant has a stable event name and a fixed set of fields; the log formatter
//! adds the request id from the surrounding [`crate::context`].

use tracing::{info, warn};

use crate::context;

/// Log target for note service events.
pub const TARGET: &str = "notes.service";

/// Something that happened to a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEvent<'a> {
    /// A note was inserted.
    Created {
        /// Store-assigned id.
        note_id: i64,
        /// Title of the new note.
        title: &'a str,
    },
    /// A lookup by id found a note.
    Found {
        /// Id looked up.
        note_id: i64,
    },
    /// A lookup, update, or delete found no note with the id.
    NotFound {
        /// Id looked up.
        note_id: i64,
    },
    /// A patch was applied.
    Updated {
        /// Id of the patched note.
        note_id: i64,
        /// Fields present in the patch.
        changed_fields: &'a [&'static str],
    },
    /// A note was removed.
    Deleted {
        /// Id that was removed.
        note_id: i64,
    },
    /// A page of notes was read.
    Listed {
        /// Records actually returned.
        count: usize,
        /// Requested offset.
        offset: i64,
        /// Requested limit.
        limit: i64,
    },
}

impl NoteEvent<'_> {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "note.created",
            Self::Found { .. } => "note.found",
            Self::NotFound { .. } => "note.not_found",
            Self::Updated { .. } => "note.updated",
            Self::Deleted { .. } => "note.deleted",
            Self::Listed { .. } => "note.listed",
        }
    }

    /// Write the event to the log.
    pub fn emit(&self) {
        let event = self.name();
        match *self {
            Self::Created { note_id, title } => {
                info!(target: TARGET, event, note_id, title, "note created");
            }
            Self::Found { note_id } => {
                info!(target: TARGET, event, note_id, "note found");
            }
            Self::NotFound { note_id } => {
                let route = context::current_route().unwrap_or_default();
                warn!(target: TARGET, event, note_id, route = %route, "note not found");
            }
            Self::Updated {
                note_id,
                changed_fields,
            } => {
                info!(target: TARGET, event, note_id, changed_fields = ?changed_fields, "note updated");
            }
            Self::Deleted { note_id } => {
                info!(target: TARGET, event, note_id, "note deleted");
            }
            Self::Listed {
                count,
                offset,
                limit,
            } => {
                info!(target: TARGET, event, count, offset, limit, "notes listed");
            }
        }
    }
}
