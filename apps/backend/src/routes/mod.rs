pub mod anki;
pub mod entries;
pub mod export;
pub mod generation;
pub mod sentences;
pub mod settings;

use sentences_core::store;
use sentences_core::{StoreError, WordEntry};

use crate::error::Result;
use crate::AppState;

/// Current copy of one entry.
fn entry_snapshot(state: &AppState, id: &str) -> Result<WordEntry> {
    store::lock(&state.store)
        .get(id)
        .cloned()
        .ok_or_else(|| StoreError::EntryNotFound(id.to_string()).into())
}

/// Apply an edit to one entry and save.
fn edit_entry<F>(state: &AppState, id: &str, edit: F) -> Result<WordEntry>
where
    F: FnOnce(&WordEntry) -> std::result::Result<WordEntry, StoreError>,
{
    let updated = {
        let mut entries = store::lock(&state.store);
        let current = entries
            .get(id)
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))?;
        let next = edit(current)?;
        entries.update(id, |_| next)?.clone()
    };
    state.persist()?;
    Ok(updated)
}
