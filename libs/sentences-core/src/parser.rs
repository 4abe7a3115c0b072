//! Definition text parser.
//!
//! # Format
//! ```text
//! 1. to run
//! 2) to flee
//! 3: to escape
//! 4．to be in a hurry
//! ```
//!
//! Lines that do not start with a number and a separator are ignored.
//! The user's numbering is kept as written: gaps and duplicates survive.

use std::collections::HashMap;

use crate::types::DefinitionSpec;

/// Separators accepted between the number and the text.
const SEPARATORS: [char; 5] = ['.', ')', ':', '：', '．'];

/// Longest index accepted, in digits.
const MAX_INDEX_DIGITS: usize = 3;

/// Count given to freshly parsed definitions before a preset is applied.
const DEFAULT_COUNT: u32 = 1;

/// Parse raw definition text into specs sorted by index.
pub fn parse(raw: &str) -> Vec<DefinitionSpec> {
    let mut specs: Vec<DefinitionSpec> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parse_line(line) {
            LineType::Definition { index, text } => {
                Some(DefinitionSpec::new(index, text, DEFAULT_COUNT))
            }
            LineType::Other => None,
        })
        .collect();

    // Stable: duplicates keep their input order.
    specs.sort_by_key(|spec| spec.index);
    specs
}

enum LineType<'a> {
    Definition { index: u32, text: &'a str },
    Other,
}

fn parse_line(line: &str) -> LineType<'_> {
    let digits_end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    if digits_end == 0 || digits_end > MAX_INDEX_DIGITS {
        return LineType::Other;
    }
    let Ok(index) = line[..digits_end].parse::<u32>() else {
        return LineType::Other;
    };

    let rest = line[digits_end..].trim_start();
    let mut chars = rest.chars();
    match chars.next() {
        Some(sep) if SEPARATORS.contains(&sep) => {}
        _ => return LineType::Other,
    }

    let text = chars.as_str().trim();
    if text.is_empty() {
        LineType::Other
    } else {
        LineType::Definition { index, text }
    }
}

/// Assign counts from a preset such as `"1/2/3"`, positionally.
///
/// Past the end of the preset the last value repeats. Values that are not
/// positive numbers become 1.
pub fn apply_count_preset(specs: Vec<DefinitionSpec>, preset: &str) -> Vec<DefinitionSpec> {
    let parts: Vec<Option<u32>> = preset
        .split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_preset_value)
        .collect();

    let fallback = parts.last().copied().flatten().unwrap_or(1);

    specs
        .into_iter()
        .enumerate()
        .map(|(position, spec)| {
            let count = match parts.get(position) {
                Some(value) => value.unwrap_or(1),
                None => fallback,
            };
            DefinitionSpec { count, ..spec }
        })
        .collect()
}

fn parse_preset_value(part: &str) -> Option<u32> {
    let value = part.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor();
    if floored >= 1.0 && floored <= f64::from(u32::MAX) {
        Some(floored as u32)
    } else {
        None
    }
}

/// Carry counts and analysis fields over from the previous definitions
/// when the index is unchanged.
pub fn merge_counts(next: Vec<DefinitionSpec>, prev: &[DefinitionSpec]) -> Vec<DefinitionSpec> {
    let prev_by_index: HashMap<u32, &DefinitionSpec> =
        prev.iter().map(|spec| (spec.index, spec)).collect();

    next.into_iter()
        .map(|spec| match prev_by_index.get(&spec.index) {
            Some(previous) => DefinitionSpec {
                count: previous.count,
                ..spec
            }
            .with_analysis_of(previous),
            None => spec,
        })
        .collect()
}

/// Full re-parse pipeline used when the user edits the definition text.
pub fn reparse(raw: &str, preset: &str, prev: &[DefinitionSpec]) -> Vec<DefinitionSpec> {
    merge_counts(apply_count_preset(parse(raw), preset), prev)
}

/// Render dictionary meanings as numbered definition text.
pub fn meanings_to_raw(meanings: &[String]) -> String {
    meanings
        .iter()
        .enumerate()
        .map(|(i, meaning)| format!("{}. {}", i + 1, meaning))
        .collect::<Vec<_>>()
        .join("\n")
}
