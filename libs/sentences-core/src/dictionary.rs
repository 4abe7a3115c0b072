//! Dictionary lookup used to pre-fill an entry's definitions.
//!
//! Auto-fill is a convenience. Every failure leaves the entry unchanged
//! and is reported, never raised.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::busy::{BusySet, Operation};
use crate::error::{RemoteError, StoreError};
use crate::parser::{meanings_to_raw, reparse};
use crate::settings::AppSettings;
use crate::store::{self, SharedStore};
use crate::types::WordEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub reading: Option<String>,
    pub meanings: Vec<String>,
    /// Vocabulary and spelling id in the dictionary service.
    pub external_id: Option<(i64, i64)>,
}

#[async_trait]
pub trait DictionaryClient: Send + Sync {
    /// `Ok(None)` when the service knows no such word.
    async fn lookup(&self, credential: &str, word: &str)
        -> Result<Option<DictionaryEntry>, RemoteError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AutofillOutcome {
    Filled {
        definitions: usize,
        reading_filled: bool,
    },
    Skipped {
        reason: String,
    },
}

fn skipped(reason: impl Into<String>) -> AutofillOutcome {
    AutofillOutcome::Skipped {
        reason: reason.into(),
    }
}

/// Merge a lookup result into an entry through the normal parse, preset
/// and count-merge pipeline. A stored reading is never overwritten.
pub fn apply_lookup(current: &WordEntry, found: &DictionaryEntry, preset: &str) -> WordEntry {
    let definitions_raw = meanings_to_raw(&found.meanings);
    let definitions = reparse(&definitions_raw, preset, &current.definitions);
    let reading = match (current.reading(), found.reading.as_deref()) {
        (None, Some(reading)) if !reading.trim().is_empty() => Some(reading.to_string()),
        _ => current.reading.clone(),
    };

    WordEntry {
        definitions_raw,
        definitions,
        reading,
        ..current.clone()
    }
}

/// Look up the entry's word and fill its definitions.
pub async fn autofill(
    client: &dyn DictionaryClient,
    busy: &BusySet,
    store: &SharedStore,
    entry_id: &str,
    settings: &AppSettings,
) -> Result<AutofillOutcome, StoreError> {
    let word = store::lock(store)
        .get(entry_id)
        .map(|e| e.word.trim().to_string())
        .ok_or_else(|| StoreError::EntryNotFound(entry_id.to_string()))?;

    if settings.jpdb_api_key.is_empty() {
        return Ok(skipped("no dictionary API key configured"));
    }
    if word.is_empty() {
        return Ok(skipped("entry has no word"));
    }
    let Some(_guard) = busy.try_acquire(Operation::Autofill, entry_id) else {
        return Ok(skipped("lookup already running"));
    };

    let found = match client.lookup(&settings.jpdb_api_key, &word).await {
        Ok(Some(found)) if !found.meanings.is_empty() => found,
        Ok(_) => return Ok(skipped(format!("no dictionary entry for {word}"))),
        Err(e) => {
            tracing::warn!(entry_id, error = %e, "dictionary lookup failed");
            return Ok(skipped(e.to_string()));
        }
    };

    let mut entries = store::lock(store);
    let Some(current) = entries.get(entry_id) else {
        return Err(StoreError::EntryNotFound(entry_id.to_string()));
    };
    if current.word.trim() != word {
        return Ok(skipped("word changed during lookup"));
    }

    let had_reading = current.reading().is_some();
    let updated = entries.update(entry_id, |current| {
        apply_lookup(current, &found, &settings.default_count_preset)
    })?;
    let reading_filled = !had_reading && updated.reading().is_some();

    Ok(AutofillOutcome::Filled {
        definitions: updated.definitions.len(),
        reading_filled,
    })
}
