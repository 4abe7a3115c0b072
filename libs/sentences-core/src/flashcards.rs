//! Flashcard store interface (decks, note types, notes).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// Lowest bridge protocol version the exporter speaks.
pub const MIN_CONNECT_VERSION: u32 = 5;

/// A note ready to be added to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub deck_name: String,
    pub model_name: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait FlashcardStore: Send + Sync {
    async fn version(&self) -> Result<u32, RemoteError>;

    async fn list_decks(&self) -> Result<Vec<String>, RemoteError>;

    async fn list_note_types(&self) -> Result<Vec<String>, RemoteError>;

    async fn list_fields(&self, note_type: &str) -> Result<Vec<String>, RemoteError>;

    /// Add all notes in one call. The result is aligned with `notes`: a new
    /// note id, or `None` where that note was rejected.
    async fn add_notes(&self, notes: &[NoteDraft]) -> Result<Vec<Option<i64>>, RemoteError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreStatus {
    Online { version: u32 },
    Outdated { version: u32 },
    Offline,
}

/// Check the store once.
pub async fn check_connectivity(store: &dyn FlashcardStore) -> StoreStatus {
    match store.version().await {
        Ok(version) if version < MIN_CONNECT_VERSION => StoreStatus::Outdated { version },
        Ok(version) => StoreStatus::Online { version },
        Err(e) => {
            tracing::debug!(error = %e, "flashcard store unreachable");
            StoreStatus::Offline
        }
    }
}
