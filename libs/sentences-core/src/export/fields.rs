//! Destination field values for exported notes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::annotation::{resolve_or_plain, AnnotationField, AnnotationService};
use crate::difficulty::Difficulty;
use crate::settings::AppSettings;
use crate::types::{AnnotationCacheEntry, KanaMode, SentenceItem, WordEntry};

/// Where a note field takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FieldSource {
    #[serde(rename = "word")]
    Word,
    #[serde(rename = "wordKana")]
    WordKana,
    #[serde(rename = "wordFuri")]
    WordFuri,
    #[serde(rename = "wordFuriHtml")]
    WordFuriHtml,
    #[serde(rename = "reading")]
    Reading,
    #[serde(rename = "meaning")]
    Meaning,
    #[serde(rename = "meaningNumber")]
    MeaningNumber,
    #[serde(rename = "sentenceJp")]
    SentenceJp,
    #[serde(rename = "sentenceJpKana")]
    SentenceJpKana,
    #[serde(rename = "sentenceJpFuri")]
    SentenceJpFuri,
    #[serde(rename = "sentenceJpFuriHtml")]
    SentenceJpFuriHtml,
    #[serde(rename = "sentenceEn")]
    SentenceEn,
    #[serde(rename = "difficulty")]
    Difficulty,
    #[serde(rename = "notes")]
    Notes,
    /// Field left empty. Also absorbs source names this build does not know.
    #[default]
    #[serde(rename = "", other)]
    Nothing,
}

impl FieldSource {
    pub const ALL: [FieldSource; 15] = [
        Self::Nothing,
        Self::Word,
        Self::WordFuri,
        Self::WordFuriHtml,
        Self::WordKana,
        Self::Reading,
        Self::Meaning,
        Self::MeaningNumber,
        Self::SentenceJp,
        Self::SentenceJpFuri,
        Self::SentenceJpFuriHtml,
        Self::SentenceJpKana,
        Self::SentenceEn,
        Self::Difficulty,
        Self::Notes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Nothing => "(Nothing)",
            Self::Word => "Word",
            Self::WordKana => "Word (Kana)",
            Self::WordFuri => "Word (Furigana)",
            Self::WordFuriHtml => "Word (Furigana HTML)",
            Self::Reading => "Word Reading",
            Self::Meaning => "Word Meaning",
            Self::MeaningNumber => "Meaning Number",
            Self::SentenceJp => "Sentence (JP)",
            Self::SentenceJpKana => "Sentence (JP Kana)",
            Self::SentenceJpFuri => "Sentence (JP Furigana)",
            Self::SentenceJpFuriHtml => "Sentence (JP Furigana HTML)",
            Self::SentenceEn => "Sentence (EN)",
            Self::Difficulty => "Difficulty",
            Self::Notes => "Notes",
        }
    }
}

/// Which text an annotated field is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Word,
    Sentence,
}

/// How to obtain one field's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPlan {
    Plain(String),
    Annotated {
        subject: Subject,
        text: String,
        field: AnnotationField,
    },
}

fn annotated_or_plain(
    subject: Subject,
    text: &str,
    field: AnnotationField,
    annotations_available: bool,
) -> FieldPlan {
    if annotations_available && !text.trim().is_empty() {
        FieldPlan::Annotated {
            subject,
            text: text.to_string(),
            field,
        }
    } else {
        FieldPlan::Plain(text.to_string())
    }
}

/// Decide a field's value without touching the annotation engine.
/// Annotated sources degrade to their plain text when annotations are
/// unavailable.
pub fn plan_field(
    source: FieldSource,
    entry: &WordEntry,
    sentence: &SentenceItem,
    annotations_available: bool,
) -> FieldPlan {
    let word = entry.word.as_str();
    let jp = sentence.jp.as_str();

    match source {
        FieldSource::Nothing => FieldPlan::Plain(String::new()),
        FieldSource::Word => FieldPlan::Plain(word.to_string()),
        FieldSource::WordKana | FieldSource::Reading => match entry.reading() {
            Some(reading) => FieldPlan::Plain(reading.to_string()),
            None => annotated_or_plain(
                Subject::Word,
                word,
                AnnotationField::Kana,
                annotations_available,
            ),
        },
        FieldSource::WordFuri => annotated_or_plain(
            Subject::Word,
            word,
            AnnotationField::Bracket,
            annotations_available,
        ),
        FieldSource::WordFuriHtml => annotated_or_plain(
            Subject::Word,
            word,
            AnnotationField::RubyHtml,
            annotations_available,
        ),
        FieldSource::Meaning => FieldPlan::Plain(
            sentence
                .definition_snapshot
                .as_ref()
                .map(|d| d.text.clone())
                .unwrap_or_default(),
        ),
        FieldSource::MeaningNumber => FieldPlan::Plain(
            sentence
                .definition_snapshot
                .as_ref()
                .map(|d| d.index.to_string())
                .unwrap_or_default(),
        ),
        FieldSource::SentenceJp => FieldPlan::Plain(jp.to_string()),
        FieldSource::SentenceJpKana => annotated_or_plain(
            Subject::Sentence,
            jp,
            AnnotationField::Kana,
            annotations_available,
        ),
        FieldSource::SentenceJpFuri => annotated_or_plain(
            Subject::Sentence,
            jp,
            AnnotationField::Bracket,
            annotations_available,
        ),
        FieldSource::SentenceJpFuriHtml => annotated_or_plain(
            Subject::Sentence,
            jp,
            AnnotationField::RubyHtml,
            annotations_available,
        ),
        FieldSource::SentenceEn => FieldPlan::Plain(sentence.en.clone()),
        FieldSource::Difficulty => FieldPlan::Plain(
            sentence
                .difficulty
                .map(|d| d.profile().short_label.to_string())
                .unwrap_or_default(),
        ),
        FieldSource::Notes => FieldPlan::Plain(sentence.notes.clone()),
    }
}

/// Field values for one note, plus any cache entries computed on the way.
#[derive(Debug, Clone, Default)]
pub struct ResolvedNote {
    pub fields: BTreeMap<String, String>,
    pub entry_cache: Option<AnnotationCacheEntry>,
    pub sentence_cache: Option<AnnotationCacheEntry>,
}

/// Resolve every destination field for one sentence.
///
/// `entry_cache` is the entry's working cache, which may already hold
/// fields computed for earlier sentences of the same entry in this export.
pub async fn resolve_note(
    field_names: &[String],
    mapping: Option<&HashMap<String, FieldSource>>,
    entry: &WordEntry,
    entry_cache: Option<&AnnotationCacheEntry>,
    sentence: &SentenceItem,
    mode: KanaMode,
    annotations: Option<&AnnotationService>,
) -> ResolvedNote {
    let mut resolved = ResolvedNote::default();
    let mut word_cache = entry_cache.cloned();
    let mut sentence_cache = sentence.annotation_cache.clone();

    for name in field_names {
        let source = mapping
            .and_then(|m| m.get(name))
            .copied()
            .unwrap_or_default();

        let plan = plan_field(source, entry, sentence, annotations.is_some());
        let value = match (plan, annotations) {
            (FieldPlan::Plain(value), _) => value,
            (FieldPlan::Annotated { text, .. }, None) => text,
            (FieldPlan::Annotated { subject, text, field }, Some(service)) => {
                let slot = match subject {
                    Subject::Word => &mut word_cache,
                    Subject::Sentence => &mut sentence_cache,
                };
                let outcome = resolve_or_plain(service, &text, mode, slot.as_ref(), field).await;
                if let Some(updated) = outcome.updated {
                    *slot = Some(updated.clone());
                    match subject {
                        Subject::Word => resolved.entry_cache = Some(updated),
                        Subject::Sentence => resolved.sentence_cache = Some(updated),
                    }
                }
                outcome.value
            }
        };

        resolved.fields.insert(name.clone(), value);
    }

    resolved
}

/// Tags for one exported note, de-duplicated in order.
pub fn build_tags(
    settings: &AppSettings,
    sentence: &SentenceItem,
    fallback: Difficulty,
) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    for tag in settings.base_tags() {
        push(tag.to_string());
    }
    if settings.anki_include_difficulty_tag {
        let difficulty = sentence.difficulty.unwrap_or(fallback);
        push(format!("difficulty-{}", difficulty.as_str()));
    }

    tags
}
