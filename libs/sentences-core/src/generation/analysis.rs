//! Meaning analysis: a model verdict on each definition, stored alongside
//! it and preserved across re-parsing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::GenerationError;
use crate::llm::{request_typed, LlmClient, StructuredJsonRequest};
use crate::settings::AppSettings;
use crate::types::{DefinitionSpec, DefinitionValidity, StudyPriority, WordEntry};

const ANALYSIS_SCHEMA_NAME: &str = "jp_srs_definition_analysis";
const ANALYSIS_SYSTEM_PROMPT: &str =
    "You analyze Japanese dictionary definitions for SRS study planning.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisItem {
    pub meaning_index: u32,
    pub validity: DefinitionValidity,
    pub study_priority: StudyPriority,
    pub comment: String,
    pub colocations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    items: Vec<AnalysisItem>,
}

fn analysis_schema() -> Value {
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
                    "required": ["meaningIndex", "validity", "studyPriority", "comment", "colocations"],
                    "properties": {
                        "meaningIndex": { "type": "integer" },
                        "validity": { "type": "string", "enum": ["valid", "dubious", "not_a_sense"] },
                        "studyPriority": { "type": "string", "enum": ["recall", "recognize", "ignore_for_now"] },
                        "comment": { "type": "string" },
                        "colocations": { "type": "array", "items": { "type": "string" } }
                    }
                }
            }
        }
    })
}

fn analysis_prompt(entry: &WordEntry) -> String {
    let mut prompt = format!("Word: {}\n", entry.word.trim());
    if let Some(reading) = entry.reading() {
        prompt.push_str(&format!("Reading: {}\n", reading));
    }
    prompt.push_str("\nMeanings:\n");
    for definition in &entry.definitions {
        prompt.push_str(&format!("{}. {}\n", definition.index, definition.text));
    }
    prompt.push_str(
        "\nFor each meaning, judge whether it is a real sense of the word, how a \
         learner should prioritise it, and list common collocations.\n",
    );
    prompt
}

pub(super) async fn request_analysis(
    llm: &dyn LlmClient,
    entry: &WordEntry,
    settings: &AppSettings,
) -> Result<Vec<AnalysisItem>, GenerationError> {
    if settings.api_key.is_empty() {
        return Err(GenerationError::MissingCredential);
    }
    if settings.model.is_empty() {
        return Err(GenerationError::MissingModel);
    }
    super::check_entry(entry)?;

    let request = StructuredJsonRequest {
        credential: settings.api_key.clone(),
        model: settings.model.clone(),
        system_prompt: ANALYSIS_SYSTEM_PROMPT.to_string(),
        user_prompt: analysis_prompt(entry),
        schema: analysis_schema(),
        schema_name: ANALYSIS_SCHEMA_NAME.to_string(),
    };
    let payload: AnalysisPayload = request_typed(llm, request).await?;
    Ok(payload.items)
}

/// Attach analysis results to definitions by index. Counts and text are
/// never touched. Returns the merged list and how many definitions matched.
pub fn merge_analysis(
    definitions: &[DefinitionSpec],
    items: &[AnalysisItem],
) -> (Vec<DefinitionSpec>, usize) {
    let by_index: HashMap<u32, &AnalysisItem> =
        items.iter().map(|item| (item.meaning_index, item)).collect();

    let mut matched = 0;
    let merged = definitions
        .iter()
        .map(|definition| match by_index.get(&definition.index) {
            Some(item) => {
                matched += 1;
                DefinitionSpec {
                    validity: Some(item.validity),
                    study_priority: Some(item.study_priority),
                    comment: Some(item.comment.clone()),
                    colocations: Some(item.colocations.clone()),
                    ..definition.clone()
                }
            }
            None => definition.clone(),
        })
        .collect();

    (merged, matched)
}
