//! Forward migrations between persisted state shapes.
//!
//! Shapes, oldest first:
//! 1. `jobs` / `selectedJobId`, difficulty under `settings.defaultDifficulty`.
//! 2. `wordEntries` / `selectedWordEntryId` / `sentenceGenDifficulty`,
//!    caches under `furiganaCache`.
//! 3. `entries` / `selectedId` / `style`, caches under `annotationCache`.
//!
//! Shapes 1 and 2 were both written with `"version": 2`; they are told
//! apart by their collection key.

use serde_json::{Map, Value};

use super::CURRENT_VERSION;

/// Identify the shape of a raw payload. `None` for anything unrecognized.
pub fn detect_version(raw: &Value) -> Option<u32> {
    let obj = raw.as_object()?;
    let tagged = obj.get("version")?.as_u64()?;
    let has_array = |key: &str| obj.get(key).is_some_and(Value::is_array);
    let has_settings = obj.get("settings").is_some_and(Value::is_object);

    match tagged {
        3 if has_array("entries") => Some(3),
        2 if has_settings && has_array("wordEntries") => Some(2),
        2 if has_settings && has_array("jobs") => Some(1),
        _ => None,
    }
}

/// Bring a payload of any known shape up to the current one.
pub fn migrate(raw: Value) -> Option<Value> {
    let mut version = detect_version(&raw)?;
    let mut value = raw;

    while version < CURRENT_VERSION {
        value = match version {
            1 => v1_to_v2(value)?,
            2 => v2_to_v3(value)?,
            _ => return None,
        };
        version += 1;
    }
    Some(value)
}

fn rename_key(obj: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = obj.remove(from) {
        obj.entry(to.to_string()).or_insert(value);
    }
}

fn v1_to_v2(mut value: Value) -> Option<Value> {
    let obj = value.as_object_mut()?;
    rename_key(obj, "jobs", "wordEntries");
    rename_key(obj, "selectedJobId", "selectedWordEntryId");

    let legacy_difficulty = obj
        .get_mut("settings")
        .and_then(Value::as_object_mut)
        .and_then(|settings| settings.remove("defaultDifficulty"));
    if !obj.contains_key("sentenceGenDifficulty") {
        obj.insert(
            "sentenceGenDifficulty".into(),
            legacy_difficulty.unwrap_or_else(|| Value::from("beginner")),
        );
    }

    // Batches did not carry a difficulty yet; the job-level one applied.
    for job in obj.get_mut("wordEntries")?.as_array_mut()? {
        let Some(job) = job.as_object_mut() else {
            continue;
        };
        let Some(difficulty) = job.get("difficulty").cloned() else {
            continue;
        };
        let Some(batches) = job.get_mut("generationBatches").and_then(Value::as_array_mut) else {
            continue;
        };
        for batch in batches.iter_mut().filter_map(Value::as_object_mut) {
            batch
                .entry("difficulty")
                .or_insert_with(|| difficulty.clone());
        }
    }

    Some(value)
}

fn v2_to_v3(mut value: Value) -> Option<Value> {
    let obj = value.as_object_mut()?;
    rename_key(obj, "wordEntries", "entries");
    rename_key(obj, "selectedWordEntryId", "selectedId");
    rename_key(obj, "sentenceGenDifficulty", "style");
    if let Some(settings) = obj.get_mut("settings").and_then(Value::as_object_mut) {
        settings.remove("defaultDifficulty");
    }

    for entry in obj.get_mut("entries")?.as_array_mut()? {
        let Some(entry) = entry.as_object_mut() else {
            continue;
        };
        rename_key(entry, "furiganaCache", "annotationCache");
        if let Some(sentences) = entry.get_mut("sentences").and_then(Value::as_array_mut) {
            for sentence in sentences.iter_mut().filter_map(Value::as_object_mut) {
                rename_key(sentence, "furiganaCache", "annotationCache");
            }
        }
    }

    obj.insert("version".into(), Value::from(3));
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn detects_each_shape() {
        assert_eq!(detect_version(&json!({"version": 3, "entries": []})), Some(3));
        assert_eq!(
            detect_version(&json!({"version": 2, "wordEntries": [], "settings": {}})),
            Some(2)
        );
        assert_eq!(
            detect_version(&json!({"version": 2, "jobs": [], "settings": {}})),
            Some(1)
        );
        assert_eq!(detect_version(&json!({"version": 2, "jobs": []})), None);
        assert_eq!(detect_version(&json!({"version": 9, "entries": []})), None);
        assert_eq!(detect_version(&json!([1, 2, 3])), None);
    }

    #[test]
    fn jobs_shape_migrates_to_current() {
        let raw = json!({
            "version": 2,
            "selectedJobId": "j1",
            "settings": { "apiKey": "", "defaultDifficulty": "intro" },
            "jobs": [{
                "id": "j1",
                "difficulty": "intermediate",
                "generationBatches": [{ "id": 1, "createdAt": 0, "definitions": [] }],
                "sentences": []
            }]
        });

        let migrated = migrate(raw).unwrap();
        assert_eq!(migrated["version"], 3);
        assert_eq!(migrated["selectedId"], "j1");
        assert_eq!(migrated["style"], "intro");
        assert!(migrated["settings"].get("defaultDifficulty").is_none());
        assert_eq!(
            migrated["entries"][0]["generationBatches"][0]["difficulty"],
            "intermediate"
        );
    }

    #[test]
    fn word_entries_shape_renames_caches() {
        let raw = json!({
            "version": 2,
            "selectedWordEntryId": "w1",
            "sentenceGenDifficulty": "native-like",
            "settings": {},
            "wordEntries": [{
                "id": "w1",
                "furiganaCache": { "key": "k" },
                "sentences": [{ "id": "s1", "furiganaCache": { "key": "k2", "kana": "か" } }]
            }]
        });

        let migrated = migrate(raw).unwrap();
        assert_eq!(migrated["style"], "native-like");
        assert_eq!(migrated["entries"][0]["annotationCache"]["key"], "k");
        assert_eq!(
            migrated["entries"][0]["sentences"][0]["annotationCache"]["kana"],
            "か"
        );
    }

    #[test]
    fn current_shape_is_untouched() {
        let raw = json!({"version": 3, "entries": [], "selectedId": null});
        assert_eq!(migrate(raw.clone()), Some(raw));
    }
}
