//! Annotation engine contract and the service that owns its lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::error::AnnotationError;
use crate::types::KanaMode;

use super::ruby::ruby_to_bracket;
use super::AnnotationField;

/// Engine identity. Part of every cache key, so bumping the version
/// invalidates everything computed by older engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineIdentity {
    pub id: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertStyle {
    /// Whole text converted to kana.
    Plain,
    /// Inline `<ruby>` markup over the original text.
    Ruby,
}

#[async_trait]
pub trait AnnotationEngine: Send + Sync {
    fn identity(&self) -> EngineIdentity;

    async fn init(&self) -> Result<(), AnnotationError>;

    async fn convert(
        &self,
        text: &str,
        mode: KanaMode,
        style: ConvertStyle,
    ) -> Result<String, AnnotationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Injected owner of an annotation engine.
///
/// Initialization is single-flight: concurrent `init()` calls share one
/// attempt, and its outcome (including a failure) is remembered.
#[derive(Clone)]
pub struct AnnotationService {
    engine: Arc<dyn AnnotationEngine>,
    init: Arc<OnceCell<Result<(), String>>>,
    started: Arc<AtomicBool>,
}

impl AnnotationService {
    pub fn new(engine: Arc<dyn AnnotationEngine>) -> Self {
        Self {
            engine,
            init: Arc::new(OnceCell::new()),
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn identity(&self) -> EngineIdentity {
        self.engine.identity()
    }

    pub async fn init(&self) -> Result<(), AnnotationError> {
        self.started.store(true, Ordering::SeqCst);
        let outcome = self
            .init
            .get_or_init(|| async {
                let result = self.engine.init().await.map_err(|e| e.to_string());
                match &result {
                    Ok(()) => {
                        tracing::info!(
                            engine = %self.engine.identity().id,
                            "annotation engine ready"
                        )
                    }
                    Err(e) => tracing::warn!(error = %e, "annotation engine failed to initialize"),
                }
                result
            })
            .await;
        outcome.clone().map_err(AnnotationError::Init)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.init.get(), Some(Ok(())))
    }

    pub fn status(&self) -> EngineStatus {
        match self.init.get() {
            Some(Ok(())) => EngineStatus::Ready,
            Some(Err(_)) => EngineStatus::Error,
            None if self.started.load(Ordering::SeqCst) => EngineStatus::Loading,
            None => EngineStatus::Idle,
        }
    }

    pub fn init_error(&self) -> Option<String> {
        self.init.get().and_then(|r| r.clone().err())
    }

    pub async fn convert(
        &self,
        text: &str,
        mode: KanaMode,
        style: ConvertStyle,
    ) -> Result<String, AnnotationError> {
        self.init().await?;
        self.engine.convert(text, mode, style).await
    }

    /// Compute one derived field for `text`.
    pub async fn compute(
        &self,
        text: &str,
        mode: KanaMode,
        field: AnnotationField,
    ) -> Result<String, AnnotationError> {
        match field {
            AnnotationField::Kana => self.convert(text, mode, ConvertStyle::Plain).await,
            AnnotationField::RubyHtml => self.convert(text, mode, ConvertStyle::Ruby).await,
            AnnotationField::Bracket => {
                let html = self.convert(text, mode, ConvertStyle::Ruby).await?;
                Ok(ruby_to_bracket(&html))
            }
        }
    }
}
