//! AnkiConnect bridge to a locally running Anki.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sentences_core::flashcards::MIN_CONNECT_VERSION;
use sentences_core::{FlashcardStore, NoteDraft, RemoteError};

use super::{check_status, malformed, network, trim_base};

const SERVICE: &str = "AnkiConnect";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<String>,
}

pub struct AnkiConnectClient {
    client: Client,
    url: String,
}

impl AnkiConnectClient {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: trim_base(url),
        }
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> Result<T, RemoteError> {
        let body = json!({ "action": action, "version": MIN_CONNECT_VERSION, "params": params });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| network(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;

        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| malformed(SERVICE, e.to_string()))?;
        unwrap_envelope(action, envelope)
    }
}

fn unwrap_envelope<T>(action: &str, envelope: Envelope<T>) -> Result<T, RemoteError> {
    if let Some(message) = envelope.error {
        return Err(RemoteError::Service {
            service: SERVICE,
            message,
        });
    }
    envelope
        .result
        .ok_or_else(|| malformed(SERVICE, format!("{action} returned no result")))
}

#[async_trait]
impl FlashcardStore for AnkiConnectClient {
    async fn version(&self) -> Result<u32, RemoteError> {
        self.invoke("version", json!({})).await
    }

    async fn list_decks(&self) -> Result<Vec<String>, RemoteError> {
        self.invoke("deckNames", json!({})).await
    }

    async fn list_note_types(&self) -> Result<Vec<String>, RemoteError> {
        self.invoke("modelNames", json!({})).await
    }

    async fn list_fields(&self, note_type: &str) -> Result<Vec<String>, RemoteError> {
        self.invoke("modelFieldNames", json!({ "modelName": note_type })).await
    }

    async fn add_notes(&self, notes: &[NoteDraft]) -> Result<Vec<Option<i64>>, RemoteError> {
        self.invoke("addNotes", json!({ "notes": notes })).await
    }
}
