use chrono::Utc;

use crate::difficulty::Difficulty;
use crate::error::GenerationError;
use crate::settings::AppSettings;
use crate::types::{new_id, SentenceGeneration, WordEntry};

use super::{render_notes, total_requested};

/// Placeholder generations used when no API key is configured. Same shape
/// as a real run: `count` items per definition, zero-count definitions
/// skipped.
pub fn build_mock_generations(
    entry: &WordEntry,
    settings: &AppSettings,
    difficulty: Difficulty,
) -> Result<Vec<SentenceGeneration>, GenerationError> {
    if total_requested(entry) == 0 {
        return Err(GenerationError::NothingRequested);
    }

    let now = Utc::now();
    let word = entry.word.trim();
    let mut results = Vec::new();

    for definition in &entry.definitions {
        for sub_index in 0..definition.count {
            results.push(SentenceGeneration {
                id: new_id(),
                def_index: definition.index,
                def_sub_index: sub_index,
                jp: if word.is_empty() {
                    "単語の例文（仮）".to_string()
                } else {
                    format!("{}の例文（仮）", word)
                },
                en: if definition.text.is_empty() {
                    "Sample sentence for the provided definition.".to_string()
                } else {
                    format!("Sample sentence for “{}”.", definition.text)
                },
                notes: render_notes(entry, &settings.notes_template, definition.index, difficulty),
                created_at: now,
                difficulty,
            });
        }
    }

    Ok(results)
}
