//! User settings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::export::FieldSource;
use crate::types::KanaMode;

pub const DEFAULT_MODEL: &str = "gpt-5-chat-latest";
pub const DEFAULT_NOTES_TEMPLATE: &str = "{word} here means “{meaning}”.";
pub const DEFAULT_COUNT_PRESET: &str = "1";

/// Field name → source, per note type.
pub type FieldMappings = HashMap<String, HashMap<String, FieldSource>>;

/// Settings edited by the user. Missing fields take their defaults, so an
/// older persisted shape merges over the current defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub api_key: String,
    pub remember_api_key: bool,
    pub model: String,

    pub jpdb_api_key: String,
    pub remember_jpdb_api_key: bool,

    pub notes_template: String,
    pub default_count_preset: String,

    pub anki_deck_name: String,
    pub anki_model_name: String,
    pub anki_field_mappings: FieldMappings,
    pub anki_tags: String,
    pub anki_include_difficulty_tag: bool,

    pub enable_furigana: bool,
    pub furigana_kana_mode: KanaMode,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            remember_api_key: false,
            model: DEFAULT_MODEL.to_string(),
            jpdb_api_key: String::new(),
            remember_jpdb_api_key: false,
            notes_template: DEFAULT_NOTES_TEMPLATE.to_string(),
            default_count_preset: DEFAULT_COUNT_PRESET.to_string(),
            anki_deck_name: String::new(),
            anki_model_name: String::new(),
            anki_field_mappings: HashMap::new(),
            anki_tags: String::new(),
            anki_include_difficulty_tag: false,
            enable_furigana: false,
            furigana_kana_mode: KanaMode::default(),
        }
    }
}

impl AppSettings {
    /// True when something required by generation or export is missing.
    pub fn needs_attention(&self) -> bool {
        self.api_key.is_empty()
            || self.model.is_empty()
            || self.anki_deck_name.is_empty()
            || self.anki_model_name.is_empty()
    }

    /// Copy safe to write to disk: credentials are kept only when the user
    /// asked to remember them.
    pub fn for_persistence(&self) -> Self {
        Self {
            api_key: if self.remember_api_key {
                self.api_key.clone()
            } else {
                String::new()
            },
            jpdb_api_key: if self.remember_jpdb_api_key {
                self.jpdb_api_key.clone()
            } else {
                String::new()
            },
            ..self.clone()
        }
    }

    /// Field mapping for the configured note type.
    pub fn field_mapping(&self) -> Option<&HashMap<String, FieldSource>> {
        self.anki_field_mappings.get(&self.anki_model_name)
    }

    /// Base tags from the whitespace-separated tag setting.
    pub fn base_tags(&self) -> impl Iterator<Item = &str> {
        self.anki_tags.split_whitespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_merges_over_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"ankiDeckName":"Mining","enableFurigana":true}"#).unwrap();
        assert_eq!(settings.anki_deck_name, "Mining");
        assert!(settings.enable_furigana);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.default_count_preset, "1");
    }

    #[test]
    fn persistence_strips_unremembered_keys() {
        let settings = AppSettings {
            api_key: "sk-1".into(),
            remember_api_key: false,
            jpdb_api_key: "jp-1".into(),
            remember_jpdb_api_key: true,
            ..AppSettings::default()
        };
        let saved = settings.for_persistence();
        assert_eq!(saved.api_key, "");
        assert_eq!(saved.jpdb_api_key, "jp-1");
    }

    #[test]
    fn needs_attention_until_configured() {
        let mut settings = AppSettings::default();
        assert!(settings.needs_attention());
        settings.api_key = "sk".into();
        settings.anki_deck_name = "Deck".into();
        settings.anki_model_name = "Basic".into();
        assert!(!settings.needs_attention());
    }
}
