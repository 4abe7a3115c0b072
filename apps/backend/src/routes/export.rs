//! Export endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// POST /api/export
///
/// Exports every sentence checked for export. Per-sentence failures are
/// reported in the summary; the request itself still succeeds.
pub async fn export(
    State(state): State<AppState>,
    request: Option<Json<ExportRequest>>,
) -> Result<Json<ExportResponse>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let style = request.style.unwrap_or_else(|| state.style());
    let settings = state.settings();

    let summary = state.export.export(&state.store, &settings, style).await?;
    state.persist()?;

    Ok(Json(ExportResponse::from(summary)))
}
