//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};

pub const DECK: &str = "Mining";
pub const NOTE_TYPE: &str = "Japanese Sentence";

/// Small reading lexicon for the built-in annotation engine.
pub const LEXICON: &str = "猫\tねこ\n走る\tはしる\n公園\tこうえん\n";

pub fn note_fields() -> Vec<String> {
    ["Word", "Reading", "Sentence", "SentenceFurigana", "Meaning", "Notes"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Field mapping for [`NOTE_TYPE`], as sent in the settings payload.
pub fn field_mapping() -> Value {
    json!({
        NOTE_TYPE: {
            "Word": "word",
            "Reading": "reading",
            "Sentence": "sentenceJp",
            "SentenceFurigana": "sentenceJpFuri",
            "Meaning": "meaning",
            "Notes": "notes"
        }
    })
}

/// Model reply with one `{defIndex, jp, en}` item per tuple.
pub fn sentence_reply(items: &[(u32, &str, &str)]) -> Value {
    json!({
        "items": items
            .iter()
            .map(|(def_index, jp, en)| json!({ "defIndex": def_index, "jp": jp, "en": en }))
            .collect::<Vec<_>>()
    })
}

/// Model reply for a meaning analysis.
pub fn analysis_reply(items: &[(u32, &str, &str)]) -> Value {
    json!({
        "items": items
            .iter()
            .map(|(index, validity, priority)| json!({
                "meaningIndex": index,
                "validity": validity,
                "studyPriority": priority,
                "comment": "",
                "colocations": []
            }))
            .collect::<Vec<_>>()
    })
}
