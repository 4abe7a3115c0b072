//! Error types for sentences-core.

use thiserror::Error;

use crate::types::{EntryStatus, StatusEvent};

/// Broad category of a failure, used by callers to decide how to surface it.
///
/// Nothing in this crate is retried automatically; the class only tells the
/// caller whether the user has to fix configuration, retry by hand, or wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing credential, model, deck or note type.
    Configuration,
    /// Non-success status or malformed body from a remote service.
    RemoteService,
    /// Model output that does not match the requested schema.
    Validation,
    /// The entry is not in a state that allows the operation.
    Precondition,
    /// Unknown entry/sentence or an operation already in flight.
    State,
}

/// Maximum number of characters of a response body kept in an error.
const EXCERPT_LEN: usize = 300;

/// Failure talking to any external service (LLM, flashcard store, dictionary).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RemoteError {
    #[error("{service} request failed: {message}")]
    Network {
        service: &'static str,
        message: String,
    },

    #[error("{service} error ({status}): {excerpt}")]
    Status {
        service: &'static str,
        status: u16,
        excerpt: String,
    },

    #[error("{service} returned a malformed body: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    #[error("{service}: {message}")]
    Service {
        service: &'static str,
        message: String,
    },
}

impl RemoteError {
    /// Build a status error keeping only an excerpt of the body.
    pub fn status(service: &'static str, status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let excerpt = if trimmed.chars().count() > EXCERPT_LEN {
            let cut: String = trimmed.chars().take(EXCERPT_LEN).collect();
            format!("{}…", cut)
        } else {
            trimmed.to_string()
        };
        Self::Status {
            service,
            status,
            excerpt,
        }
    }
}

/// Errors from sentence generation and meaning analysis.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Missing API key (Settings → API Key).")]
    MissingCredential,

    #[error("Missing model (Settings → Model).")]
    MissingModel,

    #[error("Word entry is missing a target word.")]
    EmptyWord,

    #[error("Word entry has no parsed definitions.")]
    NoDefinitions,

    #[error("All definition counts are zero.")]
    NothingRequested,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("JSON did not match expected schema: {0}")]
    Schema(String),

    #[error("word entry not found: {0}")]
    EntryNotFound(String),

    #[error("cannot {event:?} an entry that is {from:?}")]
    InvalidTransition {
        from: EntryStatus,
        event: StatusEvent,
    },

    #[error("operation already running for this entry")]
    AlreadyRunning,
}

impl GenerationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingCredential | Self::MissingModel => ErrorClass::Configuration,
            Self::EmptyWord | Self::NoDefinitions | Self::NothingRequested => {
                ErrorClass::Precondition
            }
            Self::Remote(_) => ErrorClass::RemoteService,
            Self::Schema(_) => ErrorClass::Validation,
            Self::InvalidTransition { .. } => ErrorClass::Precondition,
            Self::EntryNotFound(_) | Self::AlreadyRunning => ErrorClass::State,
        }
    }
}

/// Errors that abort an export before any per-item outcome exists.
///
/// Per-item failures are not errors; they are reported in the summary.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Missing deck (Settings → AnkiConnect).")]
    MissingDeck,

    #[error("Missing note type (Settings → AnkiConnect).")]
    MissingNoteType,

    #[error("No sentences selected for export. Use the Export checkbox on sentences first.")]
    NothingSelected,

    #[error("Note type {0} has no fields. Check Settings → AnkiConnect.")]
    NoFields(String),

    #[error("Could not export via AnkiConnect: {0}")]
    Remote(#[from] RemoteError),

    #[error("an export is already running")]
    AlreadyRunning,
}

impl ExportError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingDeck | Self::MissingNoteType | Self::NoFields(_) => {
                ErrorClass::Configuration
            }
            Self::NothingSelected => ErrorClass::Precondition,
            Self::Remote(_) => ErrorClass::RemoteService,
            Self::AlreadyRunning => ErrorClass::State,
        }
    }
}

/// Failure of the annotation engine. Always recovered from by falling back
/// to the unannotated text.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnnotationError {
    #[error("annotation engine failed to initialize: {0}")]
    Init(String),

    #[error("annotation failed: {0}")]
    Convert(String),
}

/// Errors from the in-memory entry collection.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("word entry not found: {0}")]
    EntryNotFound(String),

    #[error("sentence {sentence_id} not found in entry {entry_id}")]
    SentenceNotFound {
        entry_id: String,
        sentence_id: String,
    },

    #[error("definition {index} not found in entry {entry_id}")]
    DefinitionNotFound { entry_id: String, index: u32 },

    #[error("definition number {index} is used more than once")]
    DuplicateDefinition { entry_id: String, index: u32 },
}

/// Errors writing persisted state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}
