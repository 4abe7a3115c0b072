//! Sentence endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use sentences_core::{editing, SentenceEdit, WordEntry};

use super::edit_entry;
use crate::error::{ApiError, Result};
use crate::AppState;

/// PUT /api/entries/:id/sentences/:sid
pub async fn update(
    State(state): State<AppState>,
    Path((id, sentence_id)): Path<(String, String)>,
    Json(request): Json<SentenceEdit>,
) -> Result<Json<WordEntry>> {
    if request.is_empty() {
        return Err(ApiError::BadRequest("nothing to update".to_string()));
    }
    if request.jp.is_some() {
        state.pending_annotations.cancel(&id);
    }
    let updated = edit_entry(&state, &id, |current| {
        editing::edit_sentence(current, &sentence_id, &request)
    })?;
    Ok(Json(updated))
}

/// DELETE /api/entries/:id/sentences/:sid
pub async fn remove(
    State(state): State<AppState>,
    Path((id, sentence_id)): Path<(String, String)>,
) -> Result<Json<WordEntry>> {
    let updated = edit_entry(&state, &id, |current| {
        editing::delete_sentence(current, &sentence_id)
    })?;
    Ok(Json(updated))
}

/// POST /api/entries/:id/sentences/:sid/export-toggle
pub async fn toggle_export(
    State(state): State<AppState>,
    Path((id, sentence_id)): Path<(String, String)>,
) -> Result<Json<WordEntry>> {
    let updated = edit_entry(&state, &id, |current| {
        editing::toggle_export(current, &sentence_id)
    })?;
    Ok(Json(updated))
}
