// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP error mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use notes_core::{NoteError, ValidationErrors};

use crate::middleware::FailureCause;

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input failed field constraints.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The request could not be decoded at all.
    #[error("invalid {location}: {message}")]
    InvalidRequest {
        /// Which part of the request was rejected: `body`, `query` or `id`.
        location: &'static str,
        /// Decoder message.
        message: String,
    },

    /// No note has the requested id.
    #[error("note not found")]
    NotFound,

    /// Storage fault; the unit of work has been rolled back.
    #[error(transparent)]
    Internal(NoteError),
}

impl ApiError {
    fn invalid(location: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            location,
            message: message.into(),
        }
    }

    /// An `id` path segment below 1.
    pub fn invalid_id() -> Self {
        Self::invalid("id", "must be greater than or equal to 1")
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::Validation(errors) => Self::Validation(errors),
            other => Self::Internal(other),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid("query", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid("id", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": errors })),
            )
                .into_response(),
            ApiError::InvalidRequest { location, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": [{ "field": location, "message": message }] })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Note not found" })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                let mut response = internal_server_error();
                response
                    .extensions_mut()
                    .insert(FailureCause(err.to_string()));
                response
            }
        }
    }
}

/// The body every unhandled failure is reported with.
pub fn internal_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal Server Error" })),
    )
        .into_response()
}
