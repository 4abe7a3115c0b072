//! Core types for the word entry lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::difficulty::Difficulty;

/// Generate an opaque identifier for entries, sentences and generations.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Lifecycle status of a word entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    #[default]
    Draft,
    Generating,
    Ready,
    Error,
}

/// Event driving the entry status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Generate,
    Succeed,
    Fail,
    Clear,
}

impl EntryStatus {
    /// Apply an event, returning the next status or `None` when the
    /// transition is not allowed.
    pub fn next(self, event: StatusEvent) -> Option<Self> {
        match (self, event) {
            (_, StatusEvent::Clear) => Some(Self::Draft),
            (Self::Draft | Self::Ready | Self::Error, StatusEvent::Generate) => {
                Some(Self::Generating)
            }
            (Self::Generating, StatusEvent::Succeed) => Some(Self::Ready),
            (Self::Generating, StatusEvent::Fail) => Some(Self::Error),
            _ => None,
        }
    }
}

/// Script used for kana output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KanaMode {
    #[default]
    Hiragana,
    Katakana,
}

impl KanaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hiragana => "hiragana",
            Self::Katakana => "katakana",
        }
    }
}

/// Result of the analysis step: is this a real sense of the word?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionValidity {
    Valid,
    Dubious,
    NotASense,
}

/// Result of the analysis step: how the learner should study the sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyPriority {
    Recall,
    Recognize,
    IgnoreForNow,
}

/// One numbered meaning with its requested sentence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionSpec {
    pub index: u32,
    pub text: String,
    /// Requested sentences. Zero means "skip this definition".
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<DefinitionValidity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_priority: Option<StudyPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colocations: Option<Vec<String>>,
}

impl DefinitionSpec {
    pub fn new(index: u32, text: impl Into<String>, count: u32) -> Self {
        Self {
            index,
            text: text.into(),
            count,
            validity: None,
            study_priority: None,
            comment: None,
            colocations: None,
        }
    }

    /// Copy the analysis fields from another spec.
    pub fn with_analysis_of(mut self, other: &DefinitionSpec) -> Self {
        self.validity = other.validity;
        self.study_priority = other.study_priority;
        self.comment = other.comment.clone();
        self.colocations = other.colocations.clone();
        self
    }
}

/// Definition frozen into a generation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDefinition {
    pub index: u32,
    pub text: String,
    pub count: u32,
}

/// Immutable record of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationBatch {
    pub id: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub definitions: Vec<BatchDefinition>,
}

/// One item produced by a generation run, before it becomes a sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceGeneration {
    pub id: String,
    pub def_index: u32,
    /// Position of this item among the items for the same definition.
    pub def_sub_index: u32,
    pub jp: String,
    pub en: String,
    pub notes: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SentenceSource {
    #[default]
    Generated,
    Edited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    #[default]
    New,
    Exported,
    Failed,
}

/// Definition as it was when a sentence was generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionSnapshot {
    pub index: u32,
    pub text: String,
}

/// Cached derived representations of one source text.
///
/// Valid only while `key` matches the current (text, mode, engine) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationCacheEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruby_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anki: Option<String>,
}

fn default_true() -> bool {
    true
}

/// One example sentence, generated or edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceItem {
    pub id: String,
    pub jp: String,
    pub en: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source: SentenceSource,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub export_enabled: bool,
    #[serde(default)]
    pub export_status: ExportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_cache: Option<AnnotationCacheEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_snapshot: Option<DefinitionSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// One vocabulary item under study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub id: String,
    #[serde(default)]
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    #[serde(default)]
    pub definitions_raw: String,
    #[serde(default)]
    pub definitions: Vec<DefinitionSpec>,
    /// Items of the most recent generation run.
    #[serde(default)]
    pub generations: Vec<SentenceGeneration>,
    #[serde(default)]
    pub generation_batches: Vec<GenerationBatch>,
    #[serde(default)]
    pub sentences: Vec<SentenceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_cache: Option<AnnotationCacheEntry>,
    #[serde(default)]
    pub status: EntryStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl WordEntry {
    /// Create an empty draft entry.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            word: String::new(),
            reading: None,
            definitions_raw: String::new(),
            definitions: Vec::new(),
            generations: Vec::new(),
            generation_batches: Vec::new(),
            sentences: Vec::new(),
            annotation_cache: None,
            status: EntryStatus::Draft,
            created_at: now,
            updated_at: now,
            last_error: None,
        }
    }

    /// Reading if set and non-blank.
    pub fn reading(&self) -> Option<&str> {
        self.reading.as_deref().filter(|r| !r.trim().is_empty())
    }

    pub fn definition(&self, index: u32) -> Option<&DefinitionSpec> {
        self.definitions.iter().find(|d| d.index == index)
    }

    pub fn sentence(&self, id: &str) -> Option<&SentenceItem> {
        self.sentences.iter().find(|s| s.id == id)
    }

    /// Return a copy moved through the status machine.
    pub fn transitioned(&self, event: StatusEvent) -> Option<WordEntry> {
        let status = self.status.next(event)?;
        Some(WordEntry {
            status,
            ..self.clone()
        })
    }

    /// Return a copy with all generated material discarded.
    pub fn cleared(&self) -> WordEntry {
        WordEntry {
            generations: Vec::new(),
            generation_batches: Vec::new(),
            sentences: Vec::new(),
            status: EntryStatus::Draft,
            last_error: None,
            ..self.clone()
        }
    }
}

impl Default for WordEntry {
    fn default() -> Self {
        Self::new()
    }
}
