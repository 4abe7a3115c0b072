//! Settings endpoints

use axum::{extract::State, Json};
use sentences_core::template::{validate_macros, NOTES_MACROS};
use sentences_core::{AppSettings, Difficulty};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

fn settings_response(state: &AppState) -> SettingsResponse {
    let settings = state.settings();
    SettingsResponse {
        needs_attention: settings.needs_attention(),
        settings,
        style: state.style(),
        annotation: AnnotationStatus {
            engine: state.annotations.identity().id,
            status: state.annotations.status(),
            error: state.annotations.init_error(),
        },
    }
}

/// GET /api/settings
pub async fn get_all(State(state): State<AppState>) -> Result<Json<SettingsResponse>> {
    Ok(Json(settings_response(&state)))
}

/// PUT /api/settings
///
/// Replaces the settings. Omitted fields take their defaults.
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<AppSettings>,
) -> Result<Json<SettingsResponse>> {
    let report = validate_macros(&request.notes_template, &NOTES_MACROS);
    if report.has_forbidden_notes {
        return Err(ApiError::BadRequest(
            "notes template cannot contain {notes}".to_string(),
        ));
    }
    if !report.unknown.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "unknown macros in notes template: {}",
            report.unknown.join(", ")
        )));
    }

    let enable_furigana = request.enable_furigana;
    state.set_settings(request);
    state.persist()?;

    // Load the engine in the background.
    if enable_furigana {
        let annotations = state.annotations.clone();
        tokio::spawn(async move {
            let _ = annotations.init().await;
        });
    }

    Ok(Json(settings_response(&state)))
}

/// PUT /api/style
pub async fn update_style(
    State(state): State<AppState>,
    Json(request): Json<UpdateStyleRequest>,
) -> Result<Json<SettingsResponse>> {
    state.set_style(request.style);
    state.persist()?;
    Ok(Json(settings_response(&state)))
}

/// GET /api/styles
pub async fn styles() -> Json<Vec<StyleInfo>> {
    Json(Difficulty::ALL.into_iter().map(StyleInfo::from).collect())
}
