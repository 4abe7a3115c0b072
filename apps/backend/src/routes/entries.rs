//! Word entry endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sentences_core::dictionary::autofill as lookup_and_fill;
use sentences_core::{editing, store, AutofillOutcome, WordEntry};

use super::{edit_entry, entry_snapshot};
use crate::error::Result;
use crate::models::*;
use crate::AppState;

fn list_response(state: &AppState) -> EntryListResponse {
    let entries = store::lock(&state.store);
    EntryListResponse {
        selected_id: entries.selected_id().to_string(),
        entries: entries.entries().iter().map(EntrySummary::from).collect(),
    }
}

/// GET /api/entries
pub async fn list(State(state): State<AppState>) -> Result<Json<EntryListResponse>> {
    Ok(Json(list_response(&state)))
}

/// POST /api/entries
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<WordEntry>)> {
    let created = store::lock(&state.store).create().clone();
    state.persist()?;
    tracing::debug!(entry_id = %created.id, "created word entry");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/entries/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WordEntry>> {
    Ok(Json(entry_snapshot(&state, &id)?))
}

/// DELETE /api/entries/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntryListResponse>> {
    store::lock(&state.store).remove(&id)?;
    state.pending_annotations.cancel(&id);
    state.persist()?;
    Ok(Json(list_response(&state)))
}

/// POST /api/entries/:id/select
pub async fn select(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntryListResponse>> {
    store::lock(&state.store).select(&id)?;
    state.persist()?;
    Ok(Json(list_response(&state)))
}

/// PUT /api/entries/:id/word
pub async fn update_word(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateWordRequest>,
) -> Result<Json<WordEntry>> {
    state.pending_annotations.cancel(&id);
    let updated = edit_entry(&state, &id, |current| {
        Ok(editing::set_word(current, &request.word, request.reading.as_deref()))
    })?;
    Ok(Json(updated))
}

/// PUT /api/entries/:id/definitions
pub async fn update_definitions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDefinitionsRequest>,
) -> Result<Json<WordEntry>> {
    let preset = request
        .preset
        .unwrap_or_else(|| state.settings().default_count_preset);
    let updated = edit_entry(&state, &id, |current| {
        editing::set_definitions(current, &request.definitions_raw, &preset)
    })?;
    Ok(Json(updated))
}

/// PUT /api/entries/:id/definitions/:index/count
pub async fn update_count(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, u32)>,
    Json(request): Json<UpdateCountRequest>,
) -> Result<Json<WordEntry>> {
    let updated = edit_entry(&state, &id, |current| {
        editing::set_count(current, index, request.count)
    })?;
    Ok(Json(updated))
}

/// POST /api/entries/:id/clear
pub async fn clear(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WordEntry>> {
    state.pending_annotations.cancel(&id);
    let updated = edit_entry(&state, &id, |current| Ok(current.cleared()))?;
    Ok(Json(updated))
}

/// POST /api/entries/:id/autofill
pub async fn autofill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AutofillOutcome>> {
    let settings = state.settings();
    let outcome = lookup_and_fill(
        state.dictionary.as_ref(),
        &state.busy,
        &state.store,
        &id,
        &settings,
    )
    .await?;

    if matches!(outcome, AutofillOutcome::Filled { .. }) {
        state.persist()?;
    }
    Ok(Json(outcome))
}
