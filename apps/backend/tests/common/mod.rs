//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext wiring the router to in-memory SQLite
//! - Scripted stand-ins for the language model, AnkiConnect and JPDB
//!
//! No test talks to the network.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::Value;

use sentences_core::{
    AppSettings, DictionaryClient, DictionaryEntry, FlashcardStore, LlmClient, NoteDraft,
    RemoteError, StateGateway, StructuredJsonRequest,
};
use srs_sentences_backend::db::SqliteGateway;
use srs_sentences_backend::services::lexicon::LexiconEngine;
use srs_sentences_backend::{router, AppState, Collaborators};

/// Language model answering from a queue of canned replies.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<Value, RemoteError>>>,
    pub requests: Mutex<Vec<StructuredJsonRequest>>,
}

impl ScriptedLlm {
    pub fn push(&self, reply: Result<Value, RemoteError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn request_structured_json(
        &self,
        request: StructuredJsonRequest,
    ) -> Result<Value, RemoteError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(RemoteError::Network {
                    service: "OpenAI",
                    message: "no scripted reply".into(),
                })
            })
    }
}

/// In-memory flashcard store.
pub struct FakeAnki {
    pub version: u32,
    pub online: bool,
    pub fields: Vec<String>,
    /// Fixed `addNotes` result. `None` accepts every note.
    pub results: Mutex<Option<Vec<Option<i64>>>>,
    pub submitted: Mutex<Vec<NoteDraft>>,
}

impl Default for FakeAnki {
    fn default() -> Self {
        Self {
            version: 6,
            online: true,
            fields: fixtures::note_fields(),
            results: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

impl FakeAnki {
    fn reachable(&self) -> Result<(), RemoteError> {
        if self.online {
            Ok(())
        } else {
            Err(RemoteError::Network {
                service: "AnkiConnect",
                message: "connection refused".into(),
            })
        }
    }

    pub fn submitted(&self) -> Vec<NoteDraft> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FlashcardStore for FakeAnki {
    async fn version(&self) -> Result<u32, RemoteError> {
        self.reachable()?;
        Ok(self.version)
    }

    async fn list_decks(&self) -> Result<Vec<String>, RemoteError> {
        self.reachable()?;
        Ok(vec!["Default".into(), fixtures::DECK.into()])
    }

    async fn list_note_types(&self) -> Result<Vec<String>, RemoteError> {
        self.reachable()?;
        Ok(vec!["Basic".into(), fixtures::NOTE_TYPE.into()])
    }

    async fn list_fields(&self, note_type: &str) -> Result<Vec<String>, RemoteError> {
        self.reachable()?;
        if note_type == fixtures::NOTE_TYPE {
            Ok(self.fields.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn add_notes(&self, notes: &[NoteDraft]) -> Result<Vec<Option<i64>>, RemoteError> {
        self.reachable()?;
        self.submitted.lock().unwrap().extend_from_slice(notes);
        let fixed = self.results.lock().unwrap().clone();
        Ok(fixed.unwrap_or_else(|| (1..=notes.len() as i64).map(|id| Some(1000 + id)).collect()))
    }
}

/// Dictionary with one fixed answer.
#[derive(Default)]
pub struct FakeDictionary {
    pub entry: Option<DictionaryEntry>,
}

#[async_trait]
impl DictionaryClient for FakeDictionary {
    async fn lookup(
        &self,
        _credential: &str,
        _word: &str,
    ) -> Result<Option<DictionaryEntry>, RemoteError> {
        Ok(self.entry.clone())
    }
}

/// Test context containing the application state and its collaborators.
pub struct TestContext {
    pub state: AppState,
    pub gateway: Arc<dyn StateGateway>,
    pub llm: Arc<ScriptedLlm>,
    pub anki: Arc<FakeAnki>,
    app: Router,
}

impl TestContext {
    /// Fresh state over an in-memory database.
    pub fn new() -> Self {
        Self::with(FakeAnki::default(), FakeDictionary::default())
    }

    pub fn with(anki: FakeAnki, dictionary: FakeDictionary) -> Self {
        let gateway = SqliteGateway::open_in_memory().expect("in-memory database");
        Self::build(Arc::new(gateway), anki, dictionary)
    }

    /// State stored in a database file, as a restarted service sees it.
    pub fn at_path(path: &Path) -> Self {
        let gateway = SqliteGateway::open(path).expect("database file");
        Self::build(Arc::new(gateway), FakeAnki::default(), FakeDictionary::default())
    }

    fn build(gateway: Arc<dyn StateGateway>, anki: FakeAnki, dictionary: FakeDictionary) -> Self {
        let llm = Arc::new(ScriptedLlm::default());
        let anki = Arc::new(anki);
        let state = AppState::new(
            gateway.clone(),
            Collaborators {
                llm: llm.clone(),
                flashcards: anki.clone(),
                dictionary: Arc::new(dictionary),
                annotation: Arc::new(LexiconEngine::from_lexicon(fixtures::LEXICON)),
            },
        );
        let app = router(state.clone());
        Self {
            state,
            gateway,
            llm,
            anki,
            app,
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut AppSettings)) {
        let mut settings = self.state.settings();
        update(&mut settings);
        self.state.set_settings(settings);
    }

    /// Id of the entry selected at startup.
    pub fn selected_id(&self) -> String {
        sentences_core::store::lock(&self.state.store)
            .selected_id()
            .to_string()
    }

    /// Create an entry with a word and definitions through the API.
    pub async fn seed_entry(&self, server: &TestServer, word: &str, definitions: &str) -> String {
        let id = self.selected_id();
        server
            .put(&format!("/api/entries/{id}/word"))
            .json(&serde_json::json!({ "word": word }))
            .await
            .assert_status_ok();
        server
            .put(&format!("/api/entries/{id}/definitions"))
            .json(&serde_json::json!({ "definitionsRaw": definitions }))
            .await
            .assert_status_ok();
        id
    }
}
