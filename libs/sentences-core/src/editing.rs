//! User edits to an entry and its sentences.
//!
//! Each function is a pure transform meant for [`EntryStore::update`].
//!
//! [`EntryStore::update`]: crate::store::EntryStore::update

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::StoreError;
use crate::parser::reparse;
use crate::types::{DefinitionSpec, SentenceItem, SentenceSource, WordEntry};

/// Partial edit of one sentence. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceEdit {
    pub jp: Option<String>,
    pub en: Option<String>,
    pub notes: Option<String>,
}

impl SentenceEdit {
    pub fn is_empty(&self) -> bool {
        self.jp.is_none() && self.en.is_none() && self.notes.is_none()
    }
}

pub fn set_word(current: &WordEntry, word: &str, reading: Option<&str>) -> WordEntry {
    WordEntry {
        word: word.to_string(),
        reading: reading.map(str::to_string).or_else(|| current.reading.clone()),
        ..current.clone()
    }
}

/// Replace the definition source text and re-parse it, keeping counts and
/// analysis of definitions whose number is unchanged. Text that numbers two
/// definitions alike is rejected.
pub fn set_definitions(
    current: &WordEntry,
    raw: &str,
    preset: &str,
) -> Result<WordEntry, StoreError> {
    let definitions = reparse(raw, preset, &current.definitions);
    let mut seen = HashSet::new();
    if let Some(duplicate) = definitions.iter().find(|d| !seen.insert(d.index)) {
        return Err(StoreError::DuplicateDefinition {
            entry_id: current.id.clone(),
            index: duplicate.index,
        });
    }
    Ok(WordEntry {
        definitions_raw: raw.to_string(),
        definitions,
        ..current.clone()
    })
}

pub fn set_count(current: &WordEntry, index: u32, count: u32) -> Result<WordEntry, StoreError> {
    if current.definition(index).is_none() {
        return Err(StoreError::DefinitionNotFound {
            entry_id: current.id.clone(),
            index,
        });
    }
    let definitions = current
        .definitions
        .iter()
        .map(|d| {
            if d.index == index {
                DefinitionSpec { count, ..d.clone() }
            } else {
                d.clone()
            }
        })
        .collect();
    Ok(WordEntry {
        definitions,
        ..current.clone()
    })
}

fn map_sentence<F>(current: &WordEntry, sentence_id: &str, f: F) -> Result<WordEntry, StoreError>
where
    F: FnOnce(&SentenceItem) -> SentenceItem,
{
    let position = current
        .sentences
        .iter()
        .position(|s| s.id == sentence_id)
        .ok_or_else(|| StoreError::SentenceNotFound {
            entry_id: current.id.clone(),
            sentence_id: sentence_id.to_string(),
        })?;
    let mut sentences = current.sentences.clone();
    sentences[position] = f(&current.sentences[position]);
    Ok(WordEntry {
        sentences,
        ..current.clone()
    })
}

/// Apply a text edit. The sentence is marked as edited; a changed text
/// leaves its annotation cache to be invalidated by key.
pub fn edit_sentence(
    current: &WordEntry,
    sentence_id: &str,
    edit: &SentenceEdit,
) -> Result<WordEntry, StoreError> {
    map_sentence(current, sentence_id, |s| SentenceItem {
        jp: edit.jp.clone().unwrap_or_else(|| s.jp.clone()),
        en: edit.en.clone().unwrap_or_else(|| s.en.clone()),
        notes: edit.notes.clone().unwrap_or_else(|| s.notes.clone()),
        source: SentenceSource::Edited,
        ..s.clone()
    })
}

/// Flip the export checkbox. Exported sentences may be re-enabled.
pub fn toggle_export(current: &WordEntry, sentence_id: &str) -> Result<WordEntry, StoreError> {
    map_sentence(current, sentence_id, |s| SentenceItem {
        export_enabled: !s.export_enabled,
        ..s.clone()
    })
}

pub fn delete_sentence(current: &WordEntry, sentence_id: &str) -> Result<WordEntry, StoreError> {
    if current.sentence(sentence_id).is_none() {
        return Err(StoreError::SentenceNotFound {
            entry_id: current.id.clone(),
            sentence_id: sentence_id.to_string(),
        });
    }
    Ok(WordEntry {
        sentences: current
            .sentences
            .iter()
            .filter(|s| s.id != sentence_id)
            .cloned()
            .collect(),
        ..current.clone()
    })
}
