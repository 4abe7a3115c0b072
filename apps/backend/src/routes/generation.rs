//! Generation, analysis and annotation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use sentences_core::annotation::{annotate as annotate_target, Annotation};

use super::entry_snapshot;
use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// POST /api/entries/:id/generate
pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Option<Json<GenerateRequest>>,
) -> Result<Json<GenerateResponse>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    if let Some(style) = request.style {
        state.set_style(style);
    }
    let settings = state.settings();

    let result = state
        .generation
        .generate(&state.store, &id, &settings, state.style())
        .await;
    // A failed run is recorded on the entry, so save either way.
    let persisted = state.persist();
    let report = result?;
    persisted?;

    Ok(Json(GenerateResponse {
        report,
        entry: entry_snapshot(&state, &id)?,
    }))
}

/// POST /api/entries/:id/analyze
pub async fn analyze(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalyzeResponse>> {
    let settings = state.settings();
    let analyzed = state.generation.analyze(&state.store, &id, &settings).await?;
    state.persist()?;

    Ok(Json(AnalyzeResponse {
        analyzed,
        entry: entry_snapshot(&state, &id)?,
    }))
}

/// POST /api/entries/:id/annotate
///
/// Annotation failures fall back to the plain text and are never errors.
pub async fn annotate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AnnotateRequest>,
) -> Result<Json<Annotation>> {
    let mode = state.settings().furigana_kana_mode;
    let cancel = state.pending_annotations.flag(&id);

    let annotation = annotate_target(
        &state.store,
        &state.annotations,
        &id,
        &request.target,
        request.field,
        mode,
        &cancel,
    )
    .await?;

    if annotation.committed {
        state.persist()?;
    }
    Ok(Json(annotation))
}
