// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for notes-core.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result type using NoteError
pub type Result<T> = std::result::Result<T, NoteError>;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

/// Every field-level failure found while validating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no failures were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The recorded failures, in the order they were found.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Names of the offending fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Note errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NoteError {
    /// Input failed its declared field constraints.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A database operation failed.
    #[error("Database error during '{operation}': {source}")]
    Database {
        /// The operation that failed.
        operation: &'static str,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A persistence operation exceeded its time budget.
    #[error("Database operation '{operation}' timed out after {}ms", .after.as_millis())]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The budget that was exceeded.
        after: Duration,
    },

    /// Applying embedded migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl NoteError {
    /// Wrap a driver error with the name of the operation that produced it.
    pub fn database(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| NoteError::Database { operation, source }
    }

    /// Whether this error is a storage fault (as opposed to bad input).
    pub fn is_storage_fault(&self) -> bool {
        !matches!(self, NoteError::Validation(_))
    }
}

impl From<sqlx::Error> for NoteError {
    fn from(source: sqlx::Error) -> Self {
        NoteError::Database {
            operation: "query",
            source,
        }
    }
}
