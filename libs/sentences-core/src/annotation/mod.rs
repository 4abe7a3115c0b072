//! Content-addressed cache of derived annotations (kana, ruby markup,
//! bracket notation) attached to entries and sentences.
//!
//! A cache entry is valid only while its key matches the current text,
//! kana mode and engine. Fields inside a valid entry are filled one at a
//! time and never recomputed.

mod engine;
mod ruby;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AnnotationError, StoreError};
use crate::store::{self, SharedStore};
use crate::types::{AnnotationCacheEntry, KanaMode, SentenceItem, WordEntry};

pub use engine::{
    AnnotationEngine, AnnotationService, ConvertStyle, EngineIdentity, EngineStatus,
};
pub use ruby::{is_kanji, ruby_to_bracket};

/// One derived representation stored in a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationField {
    Kana,
    RubyHtml,
    Bracket,
}

impl AnnotationField {
    pub fn get(self, entry: &AnnotationCacheEntry) -> Option<&str> {
        match self {
            Self::Kana => entry.kana.as_deref(),
            Self::RubyHtml => entry.ruby_html.as_deref(),
            Self::Bracket => entry.anki.as_deref(),
        }
    }

    fn set(self, entry: &mut AnnotationCacheEntry, value: String) {
        match self {
            Self::Kana => entry.kana = Some(value),
            Self::RubyHtml => entry.ruby_html = Some(value),
            Self::Bracket => entry.anki = Some(value),
        }
    }
}

/// Hash of (engine id, engine version, kana mode, text).
pub fn build_key(identity: &EngineIdentity, text: &str, mode: KanaMode) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        [identity.id.as_str(), identity.version.as_str(), mode.as_str(), text]
            .join("|")
            .as_bytes(),
    );
    format!("{:x}", hasher.finalize())
}

/// Return a cache entry for `text` that has `field` filled in.
///
/// A matching entry that already has the field is returned as is, with no
/// engine call. A stale entry is discarded entirely.
pub async fn ensure_entry(
    service: &AnnotationService,
    text: &str,
    mode: KanaMode,
    existing: Option<&AnnotationCacheEntry>,
    field: AnnotationField,
) -> Result<AnnotationCacheEntry, AnnotationError> {
    let key = build_key(&service.identity(), text, mode);
    let mut entry = match existing {
        Some(existing) if existing.key == key => existing.clone(),
        _ => AnnotationCacheEntry {
            key,
            ..AnnotationCacheEntry::default()
        },
    };

    if field.get(&entry).is_some() {
        return Ok(entry);
    }

    let value = service.compute(text, mode, field).await?;
    field.set(&mut entry, value);
    Ok(entry)
}

/// Annotated value plus the cache entry to commit, if anything changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub updated: Option<AnnotationCacheEntry>,
    /// The engine failed and `value` is the unannotated text.
    pub fallback: bool,
}

/// Like [`ensure_entry`], but an engine failure degrades to the plain text.
pub async fn resolve_or_plain(
    service: &AnnotationService,
    text: &str,
    mode: KanaMode,
    existing: Option<&AnnotationCacheEntry>,
    field: AnnotationField,
) -> Resolved {
    match ensure_entry(service, text, mode, existing, field).await {
        Ok(entry) => {
            let value = field.get(&entry).unwrap_or(text).to_string();
            let changed = existing != Some(&entry);
            Resolved {
                value,
                updated: changed.then_some(entry),
                fallback: false,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "annotation failed, using plain text");
            Resolved {
                value: text.to_string(),
                updated: None,
                fallback: true,
            }
        }
    }
}

/// Cooperative cancellation for an in-flight annotation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What an annotation is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AnnotationTarget {
    /// The entry's word.
    Word,
    /// A sentence's target-language text.
    Sentence(String),
}

impl AnnotationTarget {
    fn text_and_cache<'a>(
        &self,
        entry: &'a WordEntry,
    ) -> Result<(&'a str, Option<&'a AnnotationCacheEntry>), StoreError> {
        match self {
            Self::Word => Ok((entry.word.as_str(), entry.annotation_cache.as_ref())),
            Self::Sentence(id) => {
                let sentence = entry.sentence(id).ok_or_else(|| StoreError::SentenceNotFound {
                    entry_id: entry.id.clone(),
                    sentence_id: id.clone(),
                })?;
                Ok((sentence.jp.as_str(), sentence.annotation_cache.as_ref()))
            }
        }
    }
}

/// Result of [`annotate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub value: String,
    /// The cache on the target was updated.
    pub committed: bool,
    pub fallback: bool,
}

/// Combine a freshly computed cache entry with the one attached now.
///
/// Under the same key, fields already present are kept and only missing
/// ones are filled in. A different key replaces the entry whole.
pub fn merge_cache(
    current: Option<&AnnotationCacheEntry>,
    incoming: AnnotationCacheEntry,
) -> AnnotationCacheEntry {
    match current {
        Some(current) if current.key == incoming.key => AnnotationCacheEntry {
            key: incoming.key,
            kana: current.kana.clone().or(incoming.kana),
            ruby_html: current.ruby_html.clone().or(incoming.ruby_html),
            anki: current.anki.clone().or(incoming.anki),
        },
        _ => incoming,
    }
}

/// Attach `cache` to `target` unless the target's text has changed.
/// Returns `None` when the commit was skipped.
pub fn commit_cache(
    current: &WordEntry,
    target: &AnnotationTarget,
    text: &str,
    cache: AnnotationCacheEntry,
) -> Option<WordEntry> {
    match target {
        AnnotationTarget::Word => (current.word == text).then(|| WordEntry {
            annotation_cache: Some(merge_cache(current.annotation_cache.as_ref(), cache)),
            ..current.clone()
        }),
        AnnotationTarget::Sentence(id) => {
            let sentence = current.sentence(id)?;
            if sentence.jp != text {
                return None;
            }
            let merged = merge_cache(sentence.annotation_cache.as_ref(), cache);
            let sentences = current
                .sentences
                .iter()
                .map(|s| {
                    if &s.id == id {
                        SentenceItem {
                            annotation_cache: Some(merged.clone()),
                            ..s.clone()
                        }
                    } else {
                        s.clone()
                    }
                })
                .collect();
            Some(WordEntry {
                sentences,
                ..current.clone()
            })
        }
    }
}

/// Compute one annotation for a word or sentence and cache it on the
/// target.
///
/// The store lock is not held while the engine runs. The result is
/// discarded, not committed, if `cancel` fires meanwhile or the target text
/// changed; the value is still returned.
pub async fn annotate(
    store: &SharedStore,
    service: &AnnotationService,
    entry_id: &str,
    target: &AnnotationTarget,
    field: AnnotationField,
    mode: KanaMode,
    cancel: &CancelFlag,
) -> Result<Annotation, StoreError> {
    let (text, existing) = {
        let entries = store::lock(store);
        let entry = entries
            .get(entry_id)
            .ok_or_else(|| StoreError::EntryNotFound(entry_id.to_string()))?;
        let (text, cache) = target.text_and_cache(entry)?;
        (text.to_string(), cache.cloned())
    };

    let resolved = resolve_or_plain(service, &text, mode, existing.as_ref(), field).await;

    let mut committed = false;
    if let Some(cache) = resolved.updated {
        if cancel.is_cancelled() {
            tracing::debug!(entry_id, "annotation cancelled before commit");
        } else {
            let mut entries = store::lock(store);
            if let Some(current) = entries.get(entry_id) {
                if let Some(next) = commit_cache(current, target, &text, cache) {
                    entries.update(entry_id, |_| next)?;
                    committed = true;
                }
            }
        }
    }

    Ok(Annotation {
        value: resolved.value,
        committed,
        fallback: resolved.fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntryStore;
    use crate::types::{ExportStatus, SentenceSource};
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct EchoEngine {
        converts: AtomicUsize,
        broken: bool,
    }

    #[async_trait]
    impl AnnotationEngine for EchoEngine {
        fn identity(&self) -> EngineIdentity {
            EngineIdentity {
                id: "echo".into(),
                version: "1".into(),
            }
        }

        async fn init(&self) -> Result<(), AnnotationError> {
            if self.broken {
                return Err(AnnotationError::Init("no dictionary".into()));
            }
            Ok(())
        }

        async fn convert(
            &self,
            text: &str,
            mode: KanaMode,
            style: ConvertStyle,
        ) -> Result<String, AnnotationError> {
            self.converts.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(match style {
                ConvertStyle::Plain => format!("{}:{}", mode.as_str(), text),
                ConvertStyle::Ruby => format!("<ruby>{text}<rt>r</rt></ruby>"),
            })
        }
    }

    fn service_with(engine: EchoEngine) -> (AnnotationService, Arc<EchoEngine>) {
        let engine = Arc::new(engine);
        (AnnotationService::new(engine.clone()), engine)
    }

    fn sentence(id: &str, jp: &str) -> SentenceItem {
        SentenceItem {
            id: id.into(),
            jp: jp.into(),
            en: String::new(),
            notes: String::new(),
            source: SentenceSource::Generated,
            created_at: Utc::now(),
            export_enabled: true,
            export_status: ExportStatus::New,
            annotation_cache: None,
            generation_id: None,
            batch_id: None,
            definition_snapshot: None,
            difficulty: None,
        }
    }

    #[test]
    fn key_depends_on_every_component() {
        let identity = EngineIdentity {
            id: "e".into(),
            version: "1".into(),
        };
        let base = build_key(&identity, "走る", KanaMode::Hiragana);
        assert_eq!(base, build_key(&identity, "走る", KanaMode::Hiragana));
        assert_ne!(base, build_key(&identity, "走る", KanaMode::Katakana));
        assert_ne!(base, build_key(&identity, "走った", KanaMode::Hiragana));
        let bumped = EngineIdentity {
            version: "2".into(),
            ..identity.clone()
        };
        assert_ne!(base, build_key(&bumped, "走る", KanaMode::Hiragana));
    }

    #[tokio::test]
    async fn ensure_entry_is_idempotent() {
        let (service, _) = service_with(EchoEngine::default());
        let a = ensure_entry(&service, "走る", KanaMode::Hiragana, None, AnnotationField::Kana)
            .await
            .unwrap();
        let b = ensure_entry(&service, "走る", KanaMode::Hiragana, None, AnnotationField::Kana)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn valid_entry_fills_fields_incrementally() {
        let (service, engine) = service_with(EchoEngine::default());
        let kana = ensure_entry(&service, "走る", KanaMode::Hiragana, None, AnnotationField::Kana)
            .await
            .unwrap();
        let both = ensure_entry(
            &service,
            "走る",
            KanaMode::Hiragana,
            Some(&kana),
            AnnotationField::RubyHtml,
        )
        .await
        .unwrap();
        assert_eq!(both.kana, kana.kana);
        assert!(both.ruby_html.is_some());

        let again = ensure_entry(
            &service,
            "走る",
            KanaMode::Hiragana,
            Some(&both),
            AnnotationField::Kana,
        )
        .await
        .unwrap();
        assert_eq!(again, both);
        assert_eq!(engine.converts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_entry_is_discarded_whole() {
        let (service, _) = service_with(EchoEngine::default());
        let old = ensure_entry(&service, "走る", KanaMode::Hiragana, None, AnnotationField::RubyHtml)
            .await
            .unwrap();
        let fresh = ensure_entry(
            &service,
            "走った",
            KanaMode::Hiragana,
            Some(&old),
            AnnotationField::Kana,
        )
        .await
        .unwrap();
        assert_ne!(fresh.key, old.key);
        assert_eq!(fresh.ruby_html, None);
        assert_eq!(fresh.kana.as_deref(), Some("hiragana:走った"));
    }

    #[tokio::test]
    async fn engine_failure_falls_back_to_plain_text() {
        let (service, _) = service_with(EchoEngine {
            broken: true,
            ..EchoEngine::default()
        });
        let resolved =
            resolve_or_plain(&service, "走る", KanaMode::Hiragana, None, AnnotationField::Kana).await;
        assert_eq!(
            resolved,
            Resolved {
                value: "走る".into(),
                updated: None,
                fallback: true,
            }
        );
    }

    #[tokio::test]
    async fn annotate_commits_to_sentence() {
        let (service, _) = service_with(EchoEngine::default());
        let mut entry = WordEntry::new();
        entry.sentences.push(sentence("s1", "走る"));
        let id = entry.id.clone();
        let shared = EntryStore::from_parts(vec![entry], None).shared();
        let target = AnnotationTarget::Sentence("s1".into());

        let result = annotate(
            &shared,
            &service,
            &id,
            &target,
            AnnotationField::Bracket,
            KanaMode::Hiragana,
            &CancelFlag::new(),
        )
        .await
        .unwrap();
        assert_eq!(result.value, "走る[r]");
        assert!(result.committed);

        let entries = store::lock(&shared);
        let cached = entries.get(&id).unwrap().sentences[0].annotation_cache.clone();
        assert_eq!(cached.unwrap().anki.as_deref(), Some("走る[r]"));
    }

    #[tokio::test]
    async fn cancelled_annotation_is_not_committed() {
        let (service, _) = service_with(EchoEngine::default());
        let mut entry = WordEntry::new();
        entry.word = "走る".into();
        let id = entry.id.clone();
        let shared = EntryStore::from_parts(vec![entry], None).shared();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = annotate(
            &shared,
            &service,
            &id,
            &AnnotationTarget::Word,
            AnnotationField::Kana,
            KanaMode::Hiragana,
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(result.value, "hiragana:走る");
        assert!(!result.committed);
        assert_eq!(store::lock(&shared).get(&id).unwrap().annotation_cache, None);
    }

    #[tokio::test]
    async fn concurrent_fields_both_survive_commit() {
        let (service, _) = service_with(EchoEngine::default());
        let mut entry = WordEntry::new();
        entry.word = "走る".into();
        let id = entry.id.clone();
        let shared = EntryStore::from_parts(vec![entry], None).shared();
        let cancel = CancelFlag::new();

        let (kana, ruby) = tokio::join!(
            annotate(
                &shared,
                &service,
                &id,
                &AnnotationTarget::Word,
                AnnotationField::Kana,
                KanaMode::Hiragana,
                &cancel,
            ),
            annotate(
                &shared,
                &service,
                &id,
                &AnnotationTarget::Word,
                AnnotationField::RubyHtml,
                KanaMode::Hiragana,
                &cancel,
            ),
        );
        assert!(kana.unwrap().committed);
        assert!(ruby.unwrap().committed);

        let entries = store::lock(&shared);
        let cached = entries.get(&id).unwrap().annotation_cache.clone().unwrap();
        assert_eq!(cached.kana.as_deref(), Some("hiragana:走る"));
        assert_eq!(cached.ruby_html.as_deref(), Some("<ruby>走る<rt>r</rt></ruby>"));
    }

    #[test]
    fn merge_keeps_fields_under_same_key() {
        let current = AnnotationCacheEntry {
            key: "k".into(),
            kana: Some("はしる".into()),
            ..AnnotationCacheEntry::default()
        };
        let incoming = AnnotationCacheEntry {
            key: "k".into(),
            anki: Some("走[はし]る".into()),
            ..AnnotationCacheEntry::default()
        };
        let merged = merge_cache(Some(&current), incoming);
        assert_eq!(merged.kana.as_deref(), Some("はしる"));
        assert_eq!(merged.anki.as_deref(), Some("走[はし]る"));

        let replaced = merge_cache(
            Some(&current),
            AnnotationCacheEntry {
                key: "other".into(),
                ..AnnotationCacheEntry::default()
            },
        );
        assert_eq!(replaced.kana, None);
    }

    #[test]
    fn commit_skips_changed_text() {
        let mut entry = WordEntry::new();
        entry.word = "走った".into();
        let cache = AnnotationCacheEntry {
            key: "k".into(),
            ..AnnotationCacheEntry::default()
        };
        assert!(commit_cache(&entry, &AnnotationTarget::Word, "走る", cache.clone()).is_none());
        assert!(commit_cache(&entry, &AnnotationTarget::Word, "走った", cache).is_some());
    }
}
