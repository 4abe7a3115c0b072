//! In-memory word entry collection.
//!
//! Every change to an entry goes through [`EntryStore::update`] or
//! [`EntryStore::update_all`], which stamp `updated_at` and enforce the
//! entry invariants. At least one entry always exists.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::error::StoreError;
use crate::types::WordEntry;

/// Store shared between request handlers. Never held across an await.
pub type SharedStore = Arc<Mutex<EntryStore>>;

/// Lock the shared store, recovering the data if a holder panicked.
pub fn lock(store: &SharedStore) -> MutexGuard<'_, EntryStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
pub struct EntryStore {
    entries: Vec<WordEntry>,
    selected_id: String,
}

impl EntryStore {
    /// A store holding one fresh draft entry.
    pub fn new() -> Self {
        let first = WordEntry::new();
        Self {
            selected_id: first.id.clone(),
            entries: vec![first],
        }
    }

    /// Rebuild from persisted parts, repairing an empty collection or a
    /// selection that points nowhere.
    pub fn from_parts(entries: Vec<WordEntry>, selected_id: Option<String>) -> Self {
        if entries.is_empty() {
            return Self::new();
        }
        let entries: Vec<WordEntry> = entries.into_iter().map(enforce_invariants).collect();
        let selected_id = selected_id
            .filter(|id| entries.iter().any(|e| &e.id == id))
            .unwrap_or_else(|| entries[0].id.clone());
        Self {
            entries,
            selected_id,
        }
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_id(&self) -> &str {
        &self.selected_id
    }

    /// The selected entry, or the first one if the selection is stale.
    pub fn selected(&self) -> &WordEntry {
        self.get(&self.selected_id).unwrap_or(&self.entries[0])
    }

    pub fn get(&self, id: &str) -> Option<&WordEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn select(&mut self, id: &str) -> Result<(), StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::EntryNotFound(id.to_string()));
        }
        self.selected_id = id.to_string();
        Ok(())
    }

    /// Prepend a new draft entry and select it.
    pub fn create(&mut self) -> &WordEntry {
        let entry = WordEntry::new();
        self.selected_id = entry.id.clone();
        self.entries.insert(0, entry);
        &self.entries[0]
    }

    /// Remove an entry. A fresh draft replaces the last one removed.
    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Err(StoreError::EntryNotFound(id.to_string()));
        }

        if self.entries.is_empty() {
            let fresh = WordEntry::new();
            self.selected_id = fresh.id.clone();
            self.entries.push(fresh);
        } else if self.selected_id == id {
            self.selected_id = self.entries[0].id.clone();
        }
        Ok(())
    }

    /// Replace one entry with the result of `transform`.
    pub fn update<F>(&mut self, id: &str, transform: F) -> Result<&WordEntry, StoreError>
    where
        F: FnOnce(&WordEntry) -> WordEntry,
    {
        let position = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))?;

        let current = &self.entries[position];
        let next = stamp(current, transform(current));
        self.entries[position] = next;
        Ok(&self.entries[position])
    }

    /// Apply `transform` to every entry. Returning `None` leaves an entry
    /// untouched (and unstamped). Returns how many entries changed.
    pub fn update_all<F>(&mut self, mut transform: F) -> usize
    where
        F: FnMut(&WordEntry) -> Option<WordEntry>,
    {
        let mut changed = 0;
        for slot in self.entries.iter_mut() {
            if let Some(next) = transform(slot) {
                *slot = stamp(slot, next);
                changed += 1;
            }
        }
        changed
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn stamp(current: &WordEntry, next: WordEntry) -> WordEntry {
    enforce_invariants(WordEntry {
        id: current.id.clone(),
        created_at: current.created_at,
        updated_at: Utc::now(),
        ..next
    })
}

/// Definition indices must be unique within an entry; later duplicates
/// are dropped.
fn enforce_invariants(mut entry: WordEntry) -> WordEntry {
    let mut seen = HashSet::new();
    let before = entry.definitions.len();
    entry.definitions.retain(|d| seen.insert(d.index));
    if entry.definitions.len() != before {
        tracing::warn!(
            entry_id = %entry.id,
            dropped = before - entry.definitions.len(),
            "dropped definitions with duplicate indices"
        );
    }
    entry
}
