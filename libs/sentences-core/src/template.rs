//! `{macro}` templates for sentence notes.

use std::collections::HashMap;

/// Macros available to the notes template.
pub const NOTES_MACROS: [&str; 5] = ["word", "meaning", "defIndex", "reading", "difficulty"];

/// Find every `{name}` occurrence with an identifier-like name.
///
/// Returns `(start, end, name)` byte ranges covering the braces.
fn scan(template: &str) -> Vec<(usize, usize, &str)> {
    let mut found = Vec::new();
    let mut search_from = 0;

    while let Some(open) = template[search_from..].find('{') {
        let open = search_from + open;
        let after = &template[open + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if name_len > 0 && after[name_len..].starts_with('}') {
            let end = open + 1 + name_len + 1;
            found.push((open, end, &after[..name_len]));
            search_from = end;
        } else {
            search_from = open + 1;
        }
    }

    found
}

/// Distinct macro names in order of first appearance.
pub fn extract_macros(template: &str) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    for (_, _, name) in scan(template) {
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Outcome of checking a template against an allowlist.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct MacroReport {
    pub unknown: Vec<String>,
    /// `{notes}` would make the notes template recursive.
    pub has_forbidden_notes: bool,
}

pub fn validate_macros(template: &str, allowlist: &[&str]) -> MacroReport {
    let macros = extract_macros(template);
    MacroReport {
        unknown: macros
            .iter()
            .filter(|m| m.as_str() != "notes" && !allowlist.contains(&m.as_str()))
            .cloned()
            .collect(),
        has_forbidden_notes: macros.iter().any(|m| m == "notes"),
    }
}

/// Replace `{key}` with its value. Unknown keys are left as written so
/// typos stay visible.
pub fn apply_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for (start, end, name) in scan(template) {
        out.push_str(&template[last..start]);
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&template[start..end]),
        }
        last = end;
    }

    out.push_str(&template[last..]);
    out
}
