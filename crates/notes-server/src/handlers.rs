// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP handlers for the notes resource.
//!
//! Each handler opens one unit of work, commits it only on success, and lets it drop
//! (rolling back) on every error path.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use notes_core::{Note, NoteCreate, NoteUpdate, Pagination};

use crate::AppState;
use crate::error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

/// Query string of `GET /notes`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Page size, 1..=200.
    pub limit: Option<i64>,
    /// Records to skip.
    pub offset: Option<i64>,
}

fn note_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    let Path(id) = path?;
    if id < 1 {
        return Err(ApiError::invalid_id());
    }
    Ok(id)
}

/// `GET /`
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "message": format!("Hello, {}!", state.app_name) }))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.notes.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}

/// `POST /notes`
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NoteCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let Json(payload) = payload?;

    let mut uow = state.notes.begin();
    let note = state.notes.create_note(&mut uow, payload).await?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// `GET /notes`
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Note>>> {
    let Query(params) = params?;
    let page = Pagination::new(params.offset, params.limit)?;

    let mut uow = state.notes.begin();
    let notes = state.notes.list_notes(&mut uow, page).await?;
    uow.commit().await?;

    Ok(Json(notes))
}

/// `GET /notes/{id}`
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Note>> {
    let id = note_id(path)?;

    let mut uow = state.notes.begin();
    let note = state
        .notes
        .get_note(&mut uow, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    uow.commit().await?;

    Ok(Json(note))
}

/// `PATCH /notes/{id}`
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NoteUpdate>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = note_id(path)?;
    let Json(payload) = payload?;
    let changes = payload.validate()?;

    let mut uow = state.notes.begin();
    let note = state
        .notes
        .get_note(&mut uow, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let updated = state
        .notes
        .update_note(&mut uow, &note, changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    uow.commit().await?;

    Ok(Json(updated))
}

/// `DELETE /notes/{id}`
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = note_id(path)?;

    let mut uow = state.notes.begin();
    let note = state
        .notes
        .get_note(&mut uow, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !state.notes.delete_note(&mut uow, &note).await? {
        return Err(ApiError::NotFound);
    }
    uow.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
