//! API request/response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sentences_core::annotation::EngineStatus;
use sentences_core::export::FieldSource;
use sentences_core::{
    AnnotationField, AnnotationTarget, AppSettings, Difficulty, EntryStatus, ExportSummary,
    GenerationReport, WordEntry,
};

// Entry types
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub id: String,
    pub word: String,
    pub status: EntryStatus,
    pub definition_count: usize,
    pub sentence_count: usize,
    /// Sentences currently checked for export.
    pub pending_export: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<&WordEntry> for EntrySummary {
    fn from(entry: &WordEntry) -> Self {
        Self {
            id: entry.id.clone(),
            word: entry.word.clone(),
            status: entry.status,
            definition_count: entry.definitions.len(),
            sentence_count: entry.sentences.len(),
            pending_export: entry.sentences.iter().filter(|s| s.export_enabled).count(),
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryListResponse {
    pub selected_id: String,
    pub entries: Vec<EntrySummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateWordRequest {
    pub word: String,
    pub reading: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDefinitionsRequest {
    pub definitions_raw: String,
    /// Count preset such as `"2/1"`. Defaults to the configured preset.
    pub preset: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCountRequest {
    pub count: u32,
}

// Generation types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Style for this run; also remembered as the current style.
    pub style: Option<Difficulty>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub report: GenerationReport,
    pub entry: WordEntry,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analyzed: usize,
    pub entry: WordEntry,
}

// Annotation types
#[derive(Debug, Serialize, Deserialize)]
pub struct AnnotateRequest {
    pub target: AnnotationTarget,
    pub field: AnnotationField,
}

// Export types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Style tag for sentences generated before styles were recorded.
    pub style: Option<Difficulty>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub message: String,
    pub partial: bool,
    pub summary: ExportSummary,
}

impl From<ExportSummary> for ExportResponse {
    fn from(summary: ExportSummary) -> Self {
        Self {
            message: summary.message(),
            partial: summary.is_partial(),
            summary,
        }
    }
}

// Flashcard store types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSourceInfo {
    pub value: FieldSource,
    pub label: &'static str,
}

// Settings types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationStatus {
    pub engine: String,
    pub status: EngineStatus,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub settings: AppSettings,
    pub needs_attention: bool,
    pub style: Difficulty,
    pub annotation: AnnotationStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleInfo {
    pub value: Difficulty,
    pub label: &'static str,
    pub short_label: &'static str,
    pub short_help: &'static str,
    pub max_japanese_chars: u32,
}

impl From<Difficulty> for StyleInfo {
    fn from(value: Difficulty) -> Self {
        let profile = value.profile();
        Self {
            value,
            label: profile.label,
            short_label: profile.short_label,
            short_help: profile.short_help,
            max_japanese_chars: profile.max_japanese_chars,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStyleRequest {
    pub style: Difficulty,
}
