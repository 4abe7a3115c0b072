//! Persisted application state and the gateway contract.

mod migrate;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::difficulty::Difficulty;
use crate::error::PersistenceError;
use crate::settings::AppSettings;
use crate::store::EntryStore;
use crate::types::{EntryStatus, StatusEvent, WordEntry};

pub use migrate::{detect_version, migrate};

pub const CURRENT_VERSION: u32 = 3;

const INTERRUPTED: &str = "Generation was interrupted.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub version: u32,
    pub entries: Vec<WordEntry>,
    #[serde(default)]
    pub selected_id: Option<String>,
    #[serde(default)]
    pub settings: AppSettings,
    /// Style last chosen for generation.
    #[serde(default)]
    pub style: Difficulty,
}

/// Decode a raw payload of any known shape. Unknown or broken payloads
/// yield `None` so the caller starts fresh.
pub fn decode(raw: Value) -> Option<PersistedState> {
    let current = migrate(raw)?;
    match serde_json::from_value(current) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable persisted state");
            None
        }
    }
}

pub fn encode(state: &PersistedState) -> Result<Value, PersistenceError> {
    Ok(serde_json::to_value(state)?)
}

/// Durable storage for the application state.
///
/// Implementors only move raw JSON; versioning and migration happen in
/// the provided `load`/`save`.
pub trait StateGateway: Send + Sync {
    fn load_raw(&self) -> Result<Option<Value>, PersistenceError>;

    fn save_raw(&self, payload: &Value) -> Result<(), PersistenceError>;

    fn load(&self) -> Option<PersistedState> {
        match self.load_raw() {
            Ok(Some(raw)) => decode(raw),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted state");
                None
            }
        }
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        self.save_raw(&encode(state)?)
    }
}

/// Application state rebuilt from storage.
#[derive(Debug, Clone)]
pub struct Restored {
    pub store: EntryStore,
    pub settings: AppSettings,
    pub style: Difficulty,
}

/// Rebuild in-memory state. Entries caught mid-generation are moved to
/// `error`, since no run survives a restart.
pub fn restore(state: Option<PersistedState>) -> Restored {
    let Some(state) = state else {
        return Restored {
            store: EntryStore::new(),
            settings: AppSettings::default(),
            style: Difficulty::default(),
        };
    };

    let entries = state
        .entries
        .into_iter()
        .map(|entry| match entry.status {
            EntryStatus::Generating => WordEntry {
                last_error: Some(INTERRUPTED.to_string()),
                ..entry.transitioned(StatusEvent::Fail).unwrap_or(entry)
            },
            _ => entry,
        })
        .collect();

    Restored {
        store: EntryStore::from_parts(entries, state.selected_id),
        settings: state.settings,
        style: state.style,
    }
}

/// State to write. Credentials are dropped unless the user asked to
/// remember them.
pub fn snapshot(store: &EntryStore, settings: &AppSettings, style: Difficulty) -> PersistedState {
    PersistedState {
        version: CURRENT_VERSION,
        entries: store.entries().to_vec(),
        selected_id: Some(store.selected_id().to_string()),
        settings: settings.for_persistence(),
        style,
    }
}
