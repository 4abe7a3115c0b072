//! Shared application state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use sentences_core::persistence::{restore, snapshot, Restored};
use sentences_core::store::{self, SharedStore};
use sentences_core::{
    AnnotationEngine, AnnotationService, AppSettings, BusySet, CancelFlag, Difficulty,
    DictionaryClient, ExportCoordinator, FlashcardStore, GenerationEngine, LlmClient,
    PersistenceError, StateGateway,
};

/// External services the application talks to.
pub struct Collaborators {
    pub llm: Arc<dyn LlmClient>,
    pub flashcards: Arc<dyn FlashcardStore>,
    pub dictionary: Arc<dyn DictionaryClient>,
    pub annotation: Arc<dyn AnnotationEngine>,
}

/// Cancel flags of in-flight annotations, per entry.
#[derive(Clone, Default)]
pub struct PendingAnnotations(Arc<Mutex<HashMap<String, CancelFlag>>>);

impl PendingAnnotations {
    /// Flag shared by every annotation started for `entry_id` until the
    /// entry's text changes.
    pub fn flag(&self, entry_id: &str) -> CancelFlag {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(entry_id.to_string())
            .or_default()
            .clone()
    }

    /// Cancel annotations started before an edit of `entry_id`.
    pub fn cancel(&self, entry_id: &str) {
        if let Some(flag) = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entry_id)
        {
            flag.cancel();
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    settings: Arc<RwLock<AppSettings>>,
    style: Arc<RwLock<Difficulty>>,
    gateway: Arc<dyn StateGateway>,
    pub generation: GenerationEngine,
    pub export: ExportCoordinator,
    pub annotations: AnnotationService,
    pub pending_annotations: PendingAnnotations,
    pub flashcards: Arc<dyn FlashcardStore>,
    pub dictionary: Arc<dyn DictionaryClient>,
    pub busy: BusySet,
}

impl AppState {
    /// Restore persisted state through `gateway` and wire up the engines.
    pub fn new(gateway: Arc<dyn StateGateway>, collaborators: Collaborators) -> Self {
        let Restored {
            store,
            settings,
            style,
        } = restore(gateway.load());
        tracing::info!(entries = store.len(), "restored application state");

        let busy = BusySet::new();
        let annotations = AnnotationService::new(collaborators.annotation);
        Self {
            store: store.shared(),
            settings: Arc::new(RwLock::new(settings)),
            style: Arc::new(RwLock::new(style)),
            gateway,
            generation: GenerationEngine::new(collaborators.llm, busy.clone()),
            export: ExportCoordinator::new(
                collaborators.flashcards.clone(),
                annotations.clone(),
                busy.clone(),
            ),
            annotations,
            pending_annotations: PendingAnnotations::default(),
            flashcards: collaborators.flashcards,
            dictionary: collaborators.dictionary,
            busy,
        }
    }

    pub fn settings(&self) -> AppSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_settings(&self, settings: AppSettings) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn style(&self) -> Difficulty {
        *self.style.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_style(&self, style: Difficulty) {
        *self.style.write().unwrap_or_else(PoisonError::into_inner) = style;
    }

    /// Write the current state through the gateway.
    pub fn persist(&self) -> Result<(), PersistenceError> {
        let state = snapshot(&store::lock(&self.store), &self.settings(), self.style());
        self.gateway.save(&state).inspect_err(|e| {
            tracing::warn!(error = %e, "failed to save application state");
        })
    }
}
