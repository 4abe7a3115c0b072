//! Bulk export of enabled sentences to the flashcard store, with per-item
//! reconciliation of the outcome.

mod fields;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::annotation::{merge_cache, AnnotationService};
use crate::busy::{BusySet, Operation, ALL_ENTRIES};
use crate::difficulty::Difficulty;
use crate::error::ExportError;
use crate::flashcards::{FlashcardStore, NoteDraft};
use crate::settings::AppSettings;
use crate::store::{self, SharedStore};
use crate::types::{AnnotationCacheEntry, ExportStatus, SentenceItem, WordEntry};

pub use fields::{
    build_tags, plan_field, resolve_note, FieldPlan, FieldSource, ResolvedNote, Subject,
};

/// One sentence selected for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub entry_id: String,
    pub sentence_id: String,
}

/// Every export-enabled sentence across all entries, in entry order.
pub fn collect_targets(entries: &[WordEntry]) -> Vec<ExportTarget> {
    entries
        .iter()
        .flat_map(|entry| {
            entry
                .sentences
                .iter()
                .filter(|s| s.export_enabled)
                .map(|s| ExportTarget {
                    entry_id: entry.id.clone(),
                    sentence_id: s.id.clone(),
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub entry_id: String,
    pub sentence_id: String,
    pub note_id: Option<i64>,
    pub status: ExportStatus,
}

/// Aggregate result of one export. Failed items do not make the export
/// itself a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl ExportSummary {
    fn from_outcomes(outcomes: Vec<ItemOutcome>) -> Self {
        let succeeded = outcomes
            .iter()
            .filter(|o| o.status == ExportStatus::Exported)
            .count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.failed > 0
    }

    pub fn message(&self) -> String {
        if self.is_partial() {
            format!(
                "Exported {} sentences, but {} failed. Check AnkiConnect or field mappings.",
                self.succeeded, self.failed
            )
        } else {
            format!("Success! Exported {} sentences to Anki.", self.succeeded)
        }
    }
}

/// Pair each target with its slot in the store's result array. A missing
/// slot counts as a failure.
pub fn outcomes_from_results(
    targets: &[ExportTarget],
    results: &[Option<i64>],
) -> Vec<ItemOutcome> {
    targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let note_id = results.get(i).copied().flatten();
            ItemOutcome {
                entry_id: target.entry_id.clone(),
                sentence_id: target.sentence_id.clone(),
                note_id,
                status: if note_id.is_some() {
                    ExportStatus::Exported
                } else {
                    ExportStatus::Failed
                },
            }
        })
        .collect()
}

/// A cache entry computed during export, valid for `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCache {
    pub text: String,
    pub cache: AnnotationCacheEntry,
}

/// Cache side effects collected while resolving notes, applied in the
/// reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct CacheUpdates {
    pub entries: HashMap<String, PendingCache>,
    pub sentences: HashMap<String, PendingCache>,
}

/// Apply export outcomes and cache updates to one entry. Returns `None`
/// when nothing about the entry changes.
pub fn reconcile(
    entry: &WordEntry,
    outcomes: &HashMap<&str, ExportStatus>,
    caches: &CacheUpdates,
) -> Option<WordEntry> {
    let mut touched = false;

    let sentences: Vec<SentenceItem> = entry
        .sentences
        .iter()
        .map(|sentence| {
            let status = outcomes.get(sentence.id.as_str()).copied();
            let cache = caches
                .sentences
                .get(&sentence.id)
                .filter(|pending| pending.text == sentence.jp);
            if status.is_none() && cache.is_none() {
                return sentence.clone();
            }
            touched = true;

            let mut next = sentence.clone();
            if let Some(status) = status {
                next.export_status = status;
                next.export_enabled = status != ExportStatus::Exported;
            }
            if let Some(pending) = cache {
                next.annotation_cache = Some(merge_cache(
                    sentence.annotation_cache.as_ref(),
                    pending.cache.clone(),
                ));
            }
            next
        })
        .collect();

    let entry_cache = caches
        .entries
        .get(&entry.id)
        .filter(|pending| pending.text == entry.word);
    if !touched && entry_cache.is_none() {
        return None;
    }

    Some(WordEntry {
        sentences,
        annotation_cache: match entry_cache {
            Some(pending) => Some(merge_cache(
                entry.annotation_cache.as_ref(),
                pending.cache.clone(),
            )),
            None => entry.annotation_cache.clone(),
        },
        ..entry.clone()
    })
}

/// Runs exports against a flashcard store.
#[derive(Clone)]
pub struct ExportCoordinator {
    flashcards: Arc<dyn FlashcardStore>,
    annotations: AnnotationService,
    busy: BusySet,
}

impl ExportCoordinator {
    pub fn new(
        flashcards: Arc<dyn FlashcardStore>,
        annotations: AnnotationService,
        busy: BusySet,
    ) -> Self {
        Self {
            flashcards,
            annotations,
            busy,
        }
    }

    /// Export every enabled sentence as one bulk call and record the
    /// per-sentence outcome. `difficulty` tags sentences that carry none.
    pub async fn export(
        &self,
        store: &SharedStore,
        settings: &AppSettings,
        difficulty: Difficulty,
    ) -> Result<ExportSummary, ExportError> {
        let _guard = self
            .busy
            .try_acquire(Operation::Export, ALL_ENTRIES)
            .ok_or(ExportError::AlreadyRunning)?;

        if settings.anki_deck_name.is_empty() {
            return Err(ExportError::MissingDeck);
        }
        if settings.anki_model_name.is_empty() {
            return Err(ExportError::MissingNoteType);
        }

        let entries: Vec<WordEntry> = store::lock(store).entries().to_vec();
        let targets = collect_targets(&entries);
        if targets.is_empty() {
            return Err(ExportError::NothingSelected);
        }

        let field_names = self
            .flashcards
            .list_fields(&settings.anki_model_name)
            .await?;
        if field_names.is_empty() {
            return Err(ExportError::NoFields(settings.anki_model_name.clone()));
        }

        let annotations = self.annotations_if_available(settings).await;
        let (notes, caches) = self
            .resolve_notes(&entries, &targets, &field_names, settings, difficulty, annotations)
            .await;

        tracing::info!(
            notes = notes.len(),
            deck = %settings.anki_deck_name,
            "submitting notes"
        );
        let results = self.flashcards.add_notes(&notes).await?;
        if results.len() != targets.len() {
            tracing::warn!(
                expected = targets.len(),
                received = results.len(),
                "flashcard store result length mismatch"
            );
        }

        let outcomes = outcomes_from_results(&targets, &results);
        let by_sentence: HashMap<&str, ExportStatus> = outcomes
            .iter()
            .map(|o| (o.sentence_id.as_str(), o.status))
            .collect();
        store::lock(store).update_all(|entry| reconcile(entry, &by_sentence, &caches));

        let summary = ExportSummary::from_outcomes(outcomes);
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "export finished"
        );
        Ok(summary)
    }

    async fn annotations_if_available(
        &self,
        settings: &AppSettings,
    ) -> Option<&AnnotationService> {
        if !settings.enable_furigana {
            return None;
        }
        match self.annotations.init().await {
            Ok(()) => Some(&self.annotations),
            Err(e) => {
                tracing::warn!(error = %e, "exporting without annotations");
                None
            }
        }
    }

    async fn resolve_notes(
        &self,
        entries: &[WordEntry],
        targets: &[ExportTarget],
        field_names: &[String],
        settings: &AppSettings,
        difficulty: Difficulty,
        annotations: Option<&AnnotationService>,
    ) -> (Vec<NoteDraft>, CacheUpdates) {
        let by_id: HashMap<&str, &WordEntry> =
            entries.iter().map(|e| (e.id.as_str(), e)).collect();
        let mapping = settings.field_mapping();
        let mut caches = CacheUpdates::default();
        let mut notes = Vec::with_capacity(targets.len());

        for target in targets {
            let Some(entry) = by_id.get(target.entry_id.as_str()) else {
                continue;
            };
            let Some(sentence) = entry.sentence(&target.sentence_id) else {
                continue;
            };

            let working_cache = caches
                .entries
                .get(&entry.id)
                .map(|pending| &pending.cache)
                .or(entry.annotation_cache.as_ref());

            let resolved = resolve_note(
                field_names,
                mapping,
                entry,
                working_cache,
                sentence,
                settings.furigana_kana_mode,
                annotations,
            )
            .await;

            if let Some(cache) = resolved.entry_cache {
                caches.entries.insert(
                    entry.id.clone(),
                    PendingCache {
                        text: entry.word.clone(),
                        cache,
                    },
                );
            }
            if let Some(cache) = resolved.sentence_cache {
                caches.sentences.insert(
                    sentence.id.clone(),
                    PendingCache {
                        text: sentence.jp.clone(),
                        cache,
                    },
                );
            }

            notes.push(NoteDraft {
                deck_name: settings.anki_deck_name.clone(),
                model_name: settings.anki_model_name.clone(),
                fields: resolved.fields,
                tags: build_tags(settings, sentence, difficulty),
            });
        }

        (notes, caches)
    }
}
