//! Built-in annotation engine backed by a reading lexicon.
//!
//! The lexicon is a tab-separated file of `surface<TAB>reading` lines.
//! Conversion takes the longest lexicon match at each position; text
//! without a match passes through with its kana folded to the requested
//! script.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use async_trait::async_trait;
use sentences_core::annotation::is_kanji;
use sentences_core::{AnnotationEngine, AnnotationError, ConvertStyle, EngineIdentity, KanaMode};

pub const ENGINE_ID: &str = "lexicon-kana";
pub const ENGINE_VERSION: &str = "1";

const HIRAGANA_START: u32 = 0x3041;
const HIRAGANA_END: u32 = 0x3096;
const KATAKANA_OFFSET: u32 = 0x60;

#[derive(Debug, Default)]
struct Lexicon {
    readings: HashMap<String, String>,
    /// Longest surface, in chars.
    max_len: usize,
}

impl Lexicon {
    fn parse(text: &str) -> Self {
        let mut lexicon = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((surface, reading)) = line.split_once('\t') else {
                continue;
            };
            let (surface, reading) = (surface.trim(), reading.trim());
            if surface.is_empty() || reading.is_empty() {
                continue;
            }
            lexicon.max_len = lexicon.max_len.max(surface.chars().count());
            lexicon
                .readings
                .entry(surface.to_string())
                .or_insert_with(|| reading.to_string());
        }
        lexicon
    }

    /// Longest match starting at `chars[start]`, as (length, reading).
    fn longest_match(&self, chars: &[char], start: usize) -> Option<(usize, &str)> {
        let available = chars.len() - start;
        (1..=self.max_len.min(available)).rev().find_map(|len| {
            let surface: String = chars[start..start + len].iter().collect();
            self.readings
                .get(&surface)
                .map(|reading| (len, reading.as_str()))
        })
    }
}

fn fold_char(c: char, mode: KanaMode) -> char {
    let code = c as u32;
    let folded = match mode {
        KanaMode::Katakana if (HIRAGANA_START..=HIRAGANA_END).contains(&code) => {
            code + KATAKANA_OFFSET
        }
        KanaMode::Hiragana
            if (HIRAGANA_START + KATAKANA_OFFSET..=HIRAGANA_END + KATAKANA_OFFSET)
                .contains(&code) =>
        {
            code - KATAKANA_OFFSET
        }
        _ => code,
    };
    char::from_u32(folded).unwrap_or(c)
}

/// Fold every kana in `text` to the script of `mode`.
pub fn fold_kana(text: &str, mode: KanaMode) -> String {
    text.chars().map(|c| fold_char(c, mode)).collect()
}

fn ruby(base: &str, reading: &str) -> String {
    format!("<ruby>{base}<rp>(</rp><rt>{reading}</rt><rp>)</rp></ruby>")
}

pub struct LexiconEngine {
    path: Option<PathBuf>,
    lexicon: OnceLock<Lexicon>,
}

impl LexiconEngine {
    /// Engine reading its lexicon from `path` on init. Without a path it
    /// only folds kana.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            lexicon: OnceLock::new(),
        }
    }

    /// Engine over an in-memory lexicon.
    pub fn from_lexicon(text: &str) -> Self {
        let engine = Self::new(None);
        let _ = engine.lexicon.set(Lexicon::parse(text));
        engine
    }

    fn convert_with(
        &self,
        lexicon: &Lexicon,
        text: &str,
        mode: KanaMode,
        style: ConvertStyle,
    ) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len() * 2);
        let mut i = 0;

        while i < chars.len() {
            if let Some((len, reading)) = lexicon.longest_match(&chars, i) {
                let surface: String = chars[i..i + len].iter().collect();
                let reading = fold_kana(reading, mode);
                match style {
                    ConvertStyle::Plain => out.push_str(&reading),
                    ConvertStyle::Ruby if surface.chars().any(is_kanji) => {
                        out.push_str(&ruby(&surface, &reading))
                    }
                    ConvertStyle::Ruby => out.push_str(&surface),
                }
                i += len;
                continue;
            }

            match style {
                ConvertStyle::Plain => out.push(fold_char(chars[i], mode)),
                ConvertStyle::Ruby => out.push(chars[i]),
            }
            i += 1;
        }
        out
    }
}

#[async_trait]
impl AnnotationEngine for LexiconEngine {
    fn identity(&self) -> EngineIdentity {
        EngineIdentity {
            id: ENGINE_ID.to_string(),
            version: ENGINE_VERSION.to_string(),
        }
    }

    async fn init(&self) -> Result<(), AnnotationError> {
        if self.lexicon.get().is_some() {
            return Ok(());
        }
        let lexicon = match &self.path {
            Some(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| AnnotationError::Init(format!("{}: {e}", path.display())))?;
                let lexicon = Lexicon::parse(&text);
                tracing::info!(
                    path = %path.display(),
                    surfaces = lexicon.readings.len(),
                    "loaded reading lexicon"
                );
                lexicon
            }
            None => Lexicon::default(),
        };
        let _ = self.lexicon.set(lexicon);
        Ok(())
    }

    async fn convert(
        &self,
        text: &str,
        mode: KanaMode,
        style: ConvertStyle,
    ) -> Result<String, AnnotationError> {
        let lexicon = self
            .lexicon
            .get()
            .ok_or_else(|| AnnotationError::Convert("lexicon not loaded".to_string()))?;
        Ok(self.convert_with(lexicon, text, mode, style))
    }
}
