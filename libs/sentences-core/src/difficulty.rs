//! Sentence style profiles.

use serde::{Deserialize, Serialize};

/// Style tag for a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Intro,
    #[default]
    Beginner,
    Intermediate,
    NativeLike,
    WrittenNarrative,
    UltraLiterary,
}

/// UI- and prompt-facing description of a style.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyProfile {
    pub label: &'static str,
    pub short_label: &'static str,
    pub short_help: &'static str,
    pub prompt_guidelines: &'static [&'static str],
    pub max_japanese_chars: u32,
}

impl Difficulty {
    pub const ALL: [Difficulty; 6] = [
        Self::Intro,
        Self::Beginner,
        Self::Intermediate,
        Self::NativeLike,
        Self::WrittenNarrative,
        Self::UltraLiterary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::NativeLike => "native-like",
            Self::WrittenNarrative => "written-narrative",
            Self::UltraLiterary => "ultra-literary",
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Self::Intro => DifficultyProfile {
                label: "Intro Level",
                short_label: "Intro Level",
                short_help: "Very short, very explicit sentences for first exposure.",
                max_japanese_chars: 35,
                prompt_guidelines: &[
                    "Use short sentences with one main clause.",
                    "Use very common grammar and high-frequency everyday vocabulary.",
                    "Avoid idioms, slang, and heavy ellipsis (keep subjects/objects explicit).",
                    "Prefer kana for uncommon kanji; keep wording simple and concrete.",
                ],
            },
            Self::Beginner => DifficultyProfile {
                label: "Beginner",
                short_label: "Beginner",
                short_help: "Natural but simple sentences a learner can parse comfortably.",
                max_japanese_chars: 55,
                prompt_guidelines: &[
                    "Use short sentences, but allow basic subordinate clauses (because/if/when).",
                    "Use common spoken grammar; keep phrasing natural but still explicit.",
                    "Allow light ellipsis only when it doesn't create ambiguity.",
                    "Idioms only if extremely common; avoid niche slang.",
                ],
            },
            Self::Intermediate => DifficultyProfile {
                label: "Intermediate",
                short_label: "Intermediate",
                short_help: "Natural Japanese with clauses, ellipsis, and common idioms.",
                max_japanese_chars: 80,
                prompt_guidelines: &[
                    "Use natural sentence flow with multiple clauses when appropriate.",
                    "Allow common ellipsis (dropping obvious subjects).",
                    "Include common collocations and idioms if they fit naturally.",
                    "Avoid overly academic or technical vocabulary unless necessary.",
                ],
            },
            Self::NativeLike => DifficultyProfile {
                label: "Native-like",
                short_label: "Native-like",
                short_help: "Fully natural Japanese, including cultural assumptions.",
                max_japanese_chars: 110,
                prompt_guidelines: &[
                    "Write as a native speaker would, with no simplification.",
                    "Use natural omission/ellipsis, idioms, and culturally normal phrasing.",
                    "Optimize for authenticity and nuance over clarity for learners.",
                ],
            },
            Self::WrittenNarrative => DifficultyProfile {
                label: "Written Narrative",
                short_label: "Written Narrative",
                short_help: "Written sentences similar to novel narration; denser than everyday speech.",
                max_japanese_chars: 140,
                prompt_guidelines: &[
                    "Write in a written or narrational style rather than everyday conversation.",
                    "Allow abstract phrasing and internal states, but avoid overtly essayistic prose.",
                    "Use longer sentences and denser clause structures than native-like speech.",
                    "The sentence should resemble narration from a novel or descriptive prose.",
                ],
            },
            Self::UltraLiterary => DifficultyProfile {
                label: "Ultra-Literary",
                short_label: "Ultra-Literary",
                short_help: "Dense, abstract, literary Japanese intended to be difficult.",
                max_japanese_chars: 200,
                prompt_guidelines: &[
                    "Write in an overtly literary, abstract, or essayistic style.",
                    "Prioritize nuance, metaphor, and conceptual depth over clarity.",
                    "Allow long sentences with multiple clauses and embedded structures.",
                    "Use literary or intellectual vocabulary where natural, even if uncommon.",
                    "Do not simplify for learners; assume a highly literate native reader.",
                ],
            },
        }
    }
}
