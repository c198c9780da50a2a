// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Note entity and its create / update / pagination projections.
//!
//! Inputs arrive as loosely-typed wire structs ([`NoteCreate`], [`NoteUpdate`]) and are
//! turned into validated values ([`NewNote`], [`NoteChanges`], [`Pagination`]) before
//! anything reaches the persistence layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationErrors;

/// Minimum length of `title` and `content`, in characters.
pub const MIN_FIELD_LEN: usize = 1;

/// Maximum length of `title` and `content`, in characters.
pub const MAX_FIELD_LEN: usize = 200;

/// Page size used when the caller does not give one.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 200;

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    /// Store-assigned identifier, immutable after creation.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Note body.
    pub content: String,
    /// When the note was created.
    pub created_at: DateTime<Utc>,
    /// When the note was last updated (equal to `created_at` until the first update).
    pub updated_at: DateTime<Utc>,
}

/// One text field of a client payload, kept loose so validation can name the field
/// whatever went wrong with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldInput {
    /// The key was not sent.
    #[default]
    Missing,
    /// The key was sent as `null`.
    Null,
    /// The key was sent with a non-string value.
    NotText,
    /// The key was sent with a string.
    Text(String),
}

impl<'de> Deserialize<'de> for FieldInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => FieldInput::Null,
            serde_json::Value::String(s) => FieldInput::Text(s),
            _ => FieldInput::NotText,
        })
    }
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        FieldInput::Text(value.to_string())
    }
}

impl From<String> for FieldInput {
    fn from(value: String) -> Self {
        FieldInput::Text(value)
    }
}

/// Create payload as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteCreate {
    /// Short title.
    #[serde(default)]
    pub title: FieldInput,
    /// Note body.
    #[serde(default)]
    pub content: FieldInput,
}

/// A create payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub(crate) title: String,
    pub(crate) content: String,
}

impl NewNote {
    /// Validated title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Validated content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl NoteCreate {
    /// Build a payload from two strings.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: FieldInput::Text(title.into()),
            content: FieldInput::Text(content.into()),
        }
    }

    /// Check that both fields are present strings within bounds, reporting every
    /// offending field at once.
    pub fn validate(self) -> Result<NewNote, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = check_required(&mut errors, "title", self.title);
        let content = check_required(&mut errors, "content", self.content);
        errors.into_result(NewNote {
            title: title.unwrap_or_default(),
            content: content.unwrap_or_default(),
        })
    }
}

/// Partial update as received from a client. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteUpdate {
    /// New title, if present.
    #[serde(default)]
    pub title: FieldInput,
    /// New content, if present.
    #[serde(default)]
    pub content: FieldInput,
}

/// A partial update that passed validation. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
}

impl NoteUpdate {
    /// Check bounds of every present field; an explicit `null` is rejected because
    /// neither column may be cleared.
    pub fn validate(self) -> Result<NoteChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = check_optional(&mut errors, "title", self.title);
        let content = check_optional(&mut errors, "content", self.content);
        errors.into_result(NoteChanges { title, content })
    }
}

fn check_required(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: FieldInput,
) -> Option<String> {
    match value {
        FieldInput::Missing => {
            errors.push(field, "field required");
            None
        }
        other => check_optional(errors, field, other),
    }
}

fn check_optional(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: FieldInput,
) -> Option<String> {
    match value {
        FieldInput::Missing => None,
        FieldInput::Null => {
            errors.push(field, "may not be null");
            None
        }
        FieldInput::NotText => {
            errors.push(field, "must be a string");
            None
        }
        FieldInput::Text(v) => {
            check_length(errors, field, &v);
            Some(v)
        }
    }
}

fn check_length(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    let len = value.chars().count();
    if len < MIN_FIELD_LEN {
        errors.push(
            field,
            format!("must be at least {MIN_FIELD_LEN} character"),
        );
    } else if len > MAX_FIELD_LEN {
        errors.push(
            field,
            format!("must be at most {MAX_FIELD_LEN} characters"),
        );
    }
}

impl NoteChanges {
    #[cfg(test)]
    pub(crate) fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[cfg(test)]
    pub(crate) fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// New title, if one is being applied.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// New content, if it is being applied.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Names of the fields this update overwrites, in column order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::with_capacity(2);
        if self.title.is_some() {
            fields.push("title");
        }
        if self.content.is_some() {
            fields.push("content");
        }
        fields
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    offset: i64,
    limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Build a page request; `limit` must be in `1..=200` and `offset` non-negative.
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Result<Self, ValidationErrors> {
        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        let mut errors = ValidationErrors::new();
        if !(1..=MAX_LIMIT).contains(&limit) {
            errors.push("limit", format!("must be between 1 and {MAX_LIMIT}"));
        }
        if offset < 0 {
            errors.push("offset", "must be greater than or equal to 0");
        }
        errors.into_result(Self { offset, limit })
    }

    /// Number of records to skip.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Maximum number of records to return.
    pub fn limit(&self) -> i64 {
        self.limit
    }
}
