//! Sentence generation: turns model output into batched sentence items.

mod analysis;
mod mock;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::busy::{BusySet, Operation};
use crate::difficulty::Difficulty;
use crate::error::GenerationError;
use crate::llm::{request_typed, LlmClient, StructuredJsonRequest};
use crate::settings::AppSettings;
use crate::store::{self, SharedStore};
use crate::template::apply_template;
use crate::types::{
    new_id, BatchDefinition, DefinitionSnapshot, ExportStatus, GenerationBatch,
    SentenceGeneration, SentenceItem, SentenceSource, StatusEvent, WordEntry,
};

pub use analysis::{merge_analysis, AnalysisItem};
pub use mock::build_mock_generations;

const SENTENCE_SCHEMA_NAME: &str = "jp_srs_sentences";
const SENTENCE_SYSTEM_PROMPT: &str = "You generate Japanese example sentences for SRS study.";

/// One item as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelItem {
    pub def_index: u32,
    pub jp: String,
    pub en: String,
}

#[derive(Debug, Deserialize)]
struct ModelPayload {
    items: Vec<ModelItem>,
}

/// Outcome of a successful generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub batch_id: u32,
    pub sentence_count: usize,
    /// No credential was configured, so placeholder sentences were used.
    pub mocked: bool,
}

/// Total sentences requested across all definitions.
pub fn total_requested(entry: &WordEntry) -> u32 {
    entry.definitions.iter().map(|d| d.count).sum()
}

/// Checks on the entry itself, shared by the real and the mock path.
pub fn check_entry(entry: &WordEntry) -> Result<(), GenerationError> {
    if entry.word.trim().is_empty() {
        return Err(GenerationError::EmptyWord);
    }
    if entry.definitions.is_empty() {
        return Err(GenerationError::NoDefinitions);
    }
    Ok(())
}

/// Every precondition for a model-backed run, in reporting order.
pub fn check_preconditions(
    entry: &WordEntry,
    settings: &AppSettings,
) -> Result<(), GenerationError> {
    if settings.api_key.is_empty() {
        return Err(GenerationError::MissingCredential);
    }
    if settings.model.is_empty() {
        return Err(GenerationError::MissingModel);
    }
    check_entry(entry)?;
    if total_requested(entry) == 0 {
        return Err(GenerationError::NothingRequested);
    }
    Ok(())
}

/// Next batch id for an entry: one past the highest, starting at 1.
pub fn next_batch_id(batches: &[GenerationBatch]) -> u32 {
    batches.iter().map(|b| b.id).max().map_or(1, |max| max + 1)
}

/// JSON schema for the structured sentence response.
pub fn sentence_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["items"],
        "properties": {
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["defIndex", "jp", "en"],
                    "properties": {
                        "defIndex": { "type": "integer" },
                        "jp": { "type": "string" },
                        "en": { "type": "string" }
                    }
                }
            }
        }
    })
}

fn sentence_prompt(entry: &WordEntry, difficulty: Difficulty) -> String {
    let profile = difficulty.profile();
    let mut prompt = format!("Target word: {}\n", entry.word.trim());
    if let Some(reading) = entry.reading() {
        prompt.push_str(&format!("Reading: {}\n", reading));
    }

    prompt.push_str(&format!(
        "\nStyle: {} (at most {} Japanese characters per sentence)\n",
        profile.label, profile.max_japanese_chars
    ));
    for guideline in profile.prompt_guidelines {
        prompt.push_str(&format!("- {}\n", guideline));
    }

    prompt.push_str("\nDefinitions (index, meaning, sentences wanted):\n");
    for definition in entry.definitions.iter().filter(|d| d.count > 0) {
        prompt.push_str(&format!(
            "{}. {} ({})\n",
            definition.index, definition.text, definition.count
        ));
    }
    prompt.push_str(
        "\nReturn exactly the requested number of items per definition, \
         each tagged with its definition index as defIndex.\n",
    );
    prompt
}

/// Notes for one generated item, rendered from the user's template.
pub fn render_notes(
    entry: &WordEntry,
    template: &str,
    def_index: u32,
    difficulty: Difficulty,
) -> String {
    let meaning = entry
        .definition(def_index)
        .map(|d| d.text.clone())
        .unwrap_or_default();
    let vars = HashMap::from([
        ("word", entry.word.clone()),
        ("meaning", meaning),
        ("defIndex", def_index.to_string()),
        ("reading", entry.reading().unwrap_or_default().to_string()),
        ("difficulty", difficulty.as_str().to_string()),
    ]);
    apply_template(template, &vars)
}

/// Turn model items into generation records. Sub-indices count up per
/// definition in the order the items were returned.
pub fn build_generations(
    entry: &WordEntry,
    items: Vec<ModelItem>,
    notes_template: &str,
    difficulty: Difficulty,
    created_at: DateTime<Utc>,
) -> Vec<SentenceGeneration> {
    let mut next_sub_index: HashMap<u32, u32> = HashMap::new();

    items
        .into_iter()
        .map(|item| {
            let slot = next_sub_index.entry(item.def_index).or_insert(0);
            let def_sub_index = *slot;
            *slot += 1;

            SentenceGeneration {
                id: new_id(),
                def_index: item.def_index,
                def_sub_index,
                notes: render_notes(entry, notes_template, item.def_index, difficulty),
                jp: item.jp,
                en: item.en,
                created_at,
                difficulty,
            }
        })
        .collect()
}

pub fn build_sentence_item(
    entry: &WordEntry,
    generation: &SentenceGeneration,
    batch_id: u32,
) -> SentenceItem {
    SentenceItem {
        id: new_id(),
        jp: generation.jp.clone(),
        en: generation.en.clone(),
        notes: generation.notes.clone(),
        source: SentenceSource::Generated,
        created_at: generation.created_at,
        export_enabled: true,
        export_status: ExportStatus::New,
        annotation_cache: None,
        generation_id: Some(generation.id.clone()),
        batch_id: Some(batch_id),
        definition_snapshot: entry
            .definition(generation.def_index)
            .map(|d| DefinitionSnapshot {
                index: d.index,
                text: d.text.clone(),
            }),
        difficulty: Some(generation.difficulty),
    }
}

/// Append one run's results to an entry as a new batch and mark it ready.
///
/// Fails if the entry left `generating` while the run was in flight (it
/// was cleared), in which case the results are dropped.
pub fn apply_generations(
    current: &WordEntry,
    generations: Vec<SentenceGeneration>,
    difficulty: Difficulty,
) -> Result<(WordEntry, u32), GenerationError> {
    let status = current
        .status
        .next(StatusEvent::Succeed)
        .ok_or(GenerationError::InvalidTransition {
            from: current.status,
            event: StatusEvent::Succeed,
        })?;

    let batch_id = next_batch_id(&current.generation_batches);
    let batch = GenerationBatch {
        id: batch_id,
        created_at: generations.first().map_or_else(Utc::now, |g| g.created_at),
        difficulty,
        definitions: current
            .definitions
            .iter()
            .map(|d| BatchDefinition {
                index: d.index,
                text: d.text.clone(),
                count: d.count,
            })
            .collect(),
    };

    let mut sentences = current.sentences.clone();
    sentences.extend(
        generations
            .iter()
            .map(|g| build_sentence_item(current, g, batch_id)),
    );
    let mut generation_batches = current.generation_batches.clone();
    generation_batches.push(batch);

    let next = WordEntry {
        generations,
        generation_batches,
        sentences,
        status,
        last_error: None,
        ..current.clone()
    };
    Ok((next, batch_id))
}

/// Record a failed run. Prior batches and sentences stay as they were.
fn mark_failed(current: &WordEntry, message: &str) -> WordEntry {
    WordEntry {
        status: current.status.next(StatusEvent::Fail).unwrap_or(current.status),
        last_error: Some(message.to_string()),
        ..current.clone()
    }
}

/// Runs generation and analysis against a shared entry store.
#[derive(Clone)]
pub struct GenerationEngine {
    llm: Arc<dyn LlmClient>,
    busy: BusySet,
}

impl GenerationEngine {
    pub fn new(llm: Arc<dyn LlmClient>, busy: BusySet) -> Self {
        Self { llm, busy }
    }

    /// Generate a new batch of sentences for one entry.
    pub async fn generate(
        &self,
        store: &SharedStore,
        entry_id: &str,
        settings: &AppSettings,
        difficulty: Difficulty,
    ) -> Result<GenerationReport, GenerationError> {
        let _guard = self
            .busy
            .try_acquire(Operation::Generate, entry_id)
            .ok_or(GenerationError::AlreadyRunning)?;

        let snapshot = {
            let mut entries = store::lock(store);
            let entry = entries
                .get(entry_id)
                .ok_or_else(|| GenerationError::EntryNotFound(entry_id.to_string()))?;
            let marked = entry
                .transitioned(StatusEvent::Generate)
                .ok_or(GenerationError::InvalidTransition {
                    from: entry.status,
                    event: StatusEvent::Generate,
                })?;
            entries
                .update(entry_id, |_| marked)
                .map_err(|_| GenerationError::EntryNotFound(entry_id.to_string()))?
                .clone()
        };

        let mocked = settings.api_key.is_empty();
        let produced = if mocked {
            tracing::info!(entry_id, "no API key set, using mock results");
            check_entry(&snapshot)
                .and_then(|_| build_mock_generations(&snapshot, settings, difficulty))
        } else {
            self.request_generations(&snapshot, settings, difficulty).await
        };

        let mut entries = store::lock(store);
        match produced {
            Ok(generations) => {
                let sentence_count = generations.len();
                let mut applied = None;
                let mut failure = None;
                entries
                    .update(entry_id, |current| {
                        match apply_generations(current, generations, difficulty) {
                            Ok((next, batch_id)) => {
                                applied = Some(batch_id);
                                next
                            }
                            Err(e) => {
                                failure = Some(e);
                                current.clone()
                            }
                        }
                    })
                    .map_err(|_| GenerationError::EntryNotFound(entry_id.to_string()))?;

                if let Some(e) = failure {
                    tracing::info!(entry_id, "entry changed during generation, results dropped");
                    return Err(e);
                }
                let batch_id = applied.unwrap_or_default();
                tracing::info!(entry_id, batch_id, sentence_count, mocked, "generation finished");
                Ok(GenerationReport {
                    batch_id,
                    sentence_count,
                    mocked,
                })
            }
            Err(e) => {
                tracing::warn!(entry_id, error = %e, "generation failed");
                let message = e.to_string();
                // The entry may have been removed meanwhile; nothing to record then.
                let _ = entries.update(entry_id, |current| mark_failed(current, &message));
                Err(e)
            }
        }
    }

    async fn request_generations(
        &self,
        entry: &WordEntry,
        settings: &AppSettings,
        difficulty: Difficulty,
    ) -> Result<Vec<SentenceGeneration>, GenerationError> {
        check_preconditions(entry, settings)?;

        let request = StructuredJsonRequest {
            credential: settings.api_key.clone(),
            model: settings.model.clone(),
            system_prompt: SENTENCE_SYSTEM_PROMPT.to_string(),
            user_prompt: sentence_prompt(entry, difficulty),
            schema: sentence_schema(),
            schema_name: SENTENCE_SCHEMA_NAME.to_string(),
        };
        let payload: ModelPayload = request_typed(self.llm.as_ref(), request).await?;

        Ok(build_generations(
            entry,
            payload.items,
            &settings.notes_template,
            difficulty,
            Utc::now(),
        ))
    }

    /// Ask the model to judge each definition and merge the verdicts in.
    /// Returns how many definitions received an analysis.
    pub async fn analyze(
        &self,
        store: &SharedStore,
        entry_id: &str,
        settings: &AppSettings,
    ) -> Result<usize, GenerationError> {
        let _guard = self
            .busy
            .try_acquire(Operation::Analyze, entry_id)
            .ok_or(GenerationError::AlreadyRunning)?;

        let snapshot = store::lock(store)
            .get(entry_id)
            .cloned()
            .ok_or_else(|| GenerationError::EntryNotFound(entry_id.to_string()))?;

        let items = analysis::request_analysis(self.llm.as_ref(), &snapshot, settings).await?;

        let mut entries = store::lock(store);
        let mut matched = 0;
        entries
            .update(entry_id, |current| {
                let (definitions, count) = merge_analysis(&current.definitions, &items);
                matched = count;
                WordEntry {
                    definitions,
                    ..current.clone()
                }
            })
            .map_err(|_| GenerationError::EntryNotFound(entry_id.to_string()))?;

        tracing::info!(entry_id, matched, "meaning analysis merged");
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::store::EntryStore;
    use crate::types::{DefinitionSpec, EntryStatus};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct ScriptedLlm {
        reply: Mutex<Option<Result<Value, RemoteError>>>,
        calls: Mutex<Vec<StructuredJsonRequest>>,
    }

    impl ScriptedLlm {
        fn replying(reply: Result<Value, RemoteError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn request_structured_json(
            &self,
            request: StructuredJsonRequest,
        ) -> Result<Value, RemoteError> {
            self.calls.lock().unwrap().push(request);
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(json!({ "items": [] })))
        }
    }

    fn entry_with_counts(counts: &[u32]) -> WordEntry {
        let mut entry = WordEntry::new();
        entry.word = "走る".into();
        entry.definitions = counts
            .iter()
            .enumerate()
            .map(|(i, c)| DefinitionSpec::new(i as u32 + 1, format!("meaning {}", i + 1), *c))
            .collect();
        entry
    }

    fn configured() -> AppSettings {
        AppSettings {
            api_key: "sk-test".into(),
            ..AppSettings::default()
        }
    }

    fn store_with(entry: WordEntry) -> (SharedStore, String) {
        let id = entry.id.clone();
        (EntryStore::from_parts(vec![entry], None).shared(), id)
    }

    fn item(def_index: u32, jp: &str, en: &str) -> ModelItem {
        ModelItem {
            def_index,
            jp: jp.into(),
            en: en.into(),
        }
    }

    fn batch(id: u32) -> GenerationBatch {
        GenerationBatch {
            id,
            created_at: Utc::now(),
            difficulty: Difficulty::Beginner,
            definitions: vec![],
        }
    }

    #[test]
    fn next_batch_id_starts_at_one_and_follows_max() {
        assert_eq!(next_batch_id(&[]), 1);
        assert_eq!(next_batch_id(&[batch(1), batch(3)]), 4);
    }

    #[test]
    fn preconditions_report_in_order() {
        let entry = entry_with_counts(&[1]);
        let settings = AppSettings::default();
        assert!(matches!(
            check_preconditions(&entry, &settings),
            Err(GenerationError::MissingCredential)
        ));

        let settings = AppSettings {
            model: String::new(),
            ..configured()
        };
        assert!(matches!(
            check_preconditions(&entry, &settings),
            Err(GenerationError::MissingModel)
        ));

        let blank = WordEntry {
            word: "  ".into(),
            ..entry.clone()
        };
        assert!(matches!(
            check_preconditions(&blank, &configured()),
            Err(GenerationError::EmptyWord)
        ));

        let zero = entry_with_counts(&[0, 0]);
        assert!(matches!(
            check_preconditions(&zero, &configured()),
            Err(GenerationError::NothingRequested)
        ));
    }

    #[test]
    fn sub_indices_follow_returned_order() {
        let entry = entry_with_counts(&[2, 1]);
        let items = vec![item(1, "a", "a"), item(2, "b", "b"), item(1, "c", "c")];
        let generations = build_generations(
            &entry,
            items,
            "{word}: {meaning}",
            Difficulty::Beginner,
            Utc::now(),
        );
        let pairs: Vec<(u32, u32)> = generations
            .iter()
            .map(|g| (g.def_index, g.def_sub_index))
            .collect();
        assert_eq!(pairs, vec![(1, 0), (2, 0), (1, 1)]);
        assert_eq!(generations[1].notes, "走る: meaning 2");
    }

    #[test]
    fn apply_appends_batch_and_snapshots_definitions() {
        let mut entry = entry_with_counts(&[1]);
        entry.status = EntryStatus::Generating;
        entry.generation_batches.push(batch(2));
        let generations = build_generations(
            &entry,
            vec![item(1, "走った", "ran")],
            "",
            Difficulty::Intro,
            Utc::now(),
        );

        let (next, batch_id) = apply_generations(&entry, generations, Difficulty::Intro).unwrap();
        assert_eq!(batch_id, 3);
        assert_eq!(next.status, EntryStatus::Ready);
        assert_eq!(next.generation_batches.len(), 2);
        let sentence = &next.sentences[0];
        assert!(sentence.export_enabled);
        assert_eq!(sentence.export_status, ExportStatus::New);
        assert_eq!(sentence.batch_id, Some(3));
        assert_eq!(
            sentence.definition_snapshot,
            Some(DefinitionSnapshot {
                index: 1,
                text: "meaning 1".into(),
            })
        );
    }

    #[test]
    fn apply_rejects_entry_that_left_generating() {
        let entry = entry_with_counts(&[1]);
        assert!(matches!(
            apply_generations(&entry, vec![], Difficulty::Beginner),
            Err(GenerationError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn generate_counts_two_and_one_yield_three_items() {
        let llm = ScriptedLlm::replying(Ok(json!({
            "items": [
                { "defIndex": 1, "jp": "一", "en": "one" },
                { "defIndex": 1, "jp": "二", "en": "two" },
                { "defIndex": 2, "jp": "三", "en": "three" }
            ]
        })));
        let engine = GenerationEngine::new(llm.clone(), BusySet::new());
        let (store, id) = store_with(entry_with_counts(&[2, 1]));

        let report = engine
            .generate(&store, &id, &configured(), Difficulty::Beginner)
            .await
            .unwrap();
        assert_eq!(
            report,
            GenerationReport {
                batch_id: 1,
                sentence_count: 3,
                mocked: false,
            }
        );

        let entries = store::lock(&store);
        let entry = entries.get(&id).unwrap();
        assert_eq!(entry.status, EntryStatus::Ready);
        let subs: Vec<(u32, u32)> = entry
            .generations
            .iter()
            .map(|g| (g.def_index, g.def_sub_index))
            .collect();
        assert_eq!(subs, vec![(1, 0), (1, 1), (2, 0)]);
        assert_eq!(llm.calls.lock().unwrap()[0].schema_name, SENTENCE_SCHEMA_NAME);
    }

    #[tokio::test]
    async fn generate_failure_keeps_history() {
        let llm = ScriptedLlm::replying(Err(RemoteError::status("OpenAI", 500, "boom")));
        let engine = GenerationEngine::new(llm, BusySet::new());
        let mut entry = entry_with_counts(&[1]);
        entry.status = EntryStatus::Ready;
        entry.generation_batches.push(batch(1));
        let (store, id) = store_with(entry);

        let err = engine
            .generate(&store, &id, &configured(), Difficulty::Beginner)
            .await
            .unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::RemoteService);

        let entries = store::lock(&store);
        let entry = entries.get(&id).unwrap();
        assert_eq!(entry.status, EntryStatus::Error);
        assert_eq!(entry.generation_batches.len(), 1);
        assert!(entry.last_error.as_deref().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn schema_mismatch_is_validation_error() {
        let llm = ScriptedLlm::replying(Ok(json!({ "sentences": [] })));
        let engine = GenerationEngine::new(llm, BusySet::new());
        let (store, id) = store_with(entry_with_counts(&[1]));

        let err = engine
            .generate(&store, &id, &configured(), Difficulty::Beginner)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Schema(_)));
    }

    #[tokio::test]
    async fn missing_credential_uses_mock_without_calling_model() {
        let llm = ScriptedLlm::replying(Ok(json!({ "items": [] })));
        let engine = GenerationEngine::new(llm.clone(), BusySet::new());
        let (store, id) = store_with(entry_with_counts(&[2, 0, 1]));

        let report = engine
            .generate(&store, &id, &AppSettings::default(), Difficulty::Beginner)
            .await
            .unwrap();
        assert!(report.mocked);
        assert_eq!(report.sentence_count, 3);
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_generate_on_same_entry_is_rejected() {
        let busy = BusySet::new();
        let llm = ScriptedLlm::replying(Ok(json!({"items": []})));
        let engine = GenerationEngine::new(llm, busy.clone());
        let (store, id) = store_with(entry_with_counts(&[1]));

        let _held = busy.try_acquire(Operation::Generate, &id).unwrap();
        let err = engine
            .generate(&store, &id, &configured(), Difficulty::Beginner)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::AlreadyRunning));
    }
}
