//! Flashcard store endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use sentences_core::{check_connectivity, FieldSource, StoreStatus};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/anki/status
pub async fn status(State(state): State<AppState>) -> Json<StoreStatus> {
    Json(check_connectivity(state.flashcards.as_ref()).await)
}

/// GET /api/anki/decks
pub async fn decks(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.flashcards.list_decks().await?))
}

/// GET /api/anki/note-types
pub async fn note_types(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.flashcards.list_note_types().await?))
}

/// GET /api/anki/note-types/:name/fields
pub async fn fields(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(state.flashcards.list_fields(&name).await?))
}

/// GET /api/anki/field-sources
pub async fn field_sources() -> Json<Vec<FieldSourceInfo>> {
    Json(
        FieldSource::ALL
            .into_iter()
            .map(|value| FieldSourceInfo {
                value,
                label: value.label(),
            })
            .collect(),
    )
}
