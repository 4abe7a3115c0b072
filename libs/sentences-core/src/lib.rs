//! Word entry lifecycle engine for Japanese sentence mining.
//!
//! Provides:
//! - Definition parsing with count presets and count/analysis merging
//! - The entry store and its status machine
//! - LLM-backed sentence generation and meaning analysis
//! - A content-addressed annotation cache (kana, ruby, bracket notation)
//! - Bulk export to a flashcard store with per-item reconciliation
//! - Versioned persisted state with forward migrations

pub mod annotation;
pub mod busy;
pub mod dictionary;
pub mod difficulty;
pub mod editing;
pub mod error;
pub mod export;
pub mod flashcards;
pub mod generation;
pub mod llm;
pub mod parser;
pub mod persistence;
pub mod settings;
pub mod store;
pub mod template;
pub mod types;

pub use annotation::{
    annotate, build_key, ensure_entry, AnnotationEngine, AnnotationField, AnnotationService,
    AnnotationTarget, CancelFlag, ConvertStyle, EngineIdentity,
};
pub use busy::{BusySet, Operation};
pub use dictionary::{autofill, AutofillOutcome, DictionaryClient, DictionaryEntry};
pub use difficulty::Difficulty;
pub use editing::SentenceEdit;
pub use error::{
    AnnotationError, ErrorClass, ExportError, GenerationError, PersistenceError, RemoteError,
    StoreError,
};
pub use export::{ExportCoordinator, ExportSummary, FieldSource};
pub use flashcards::{check_connectivity, FlashcardStore, NoteDraft, StoreStatus};
pub use generation::{next_batch_id, GenerationEngine, GenerationReport};
pub use llm::{LlmClient, StructuredJsonRequest};
pub use parser::{apply_count_preset, merge_counts, parse, reparse};
pub use persistence::{PersistedState, StateGateway};
pub use settings::AppSettings;
pub use store::{EntryStore, SharedStore};
pub use types::{
    DefinitionSpec, EntryStatus, ExportStatus, GenerationBatch, KanaMode, SentenceItem,
    SentenceSource, WordEntry,
};
