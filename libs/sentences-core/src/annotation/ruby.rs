//! Ruby markup → flashcard-store bracket notation.

use std::sync::LazyLock;

use regex::Regex;

static RP_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<rp>.*?</rp>").expect("valid rp pattern"));
static RUBY_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<ruby>(.*?)<rt>(.*?)</rt>.*?</ruby>").expect("valid ruby pattern")
});

/// CJK ideographs, including Extension A, compatibility forms and the
/// iteration mark 々.
pub fn is_kanji(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}' | '々'
    )
}

/// Rewrite `<ruby>base<rt>reading</rt></ruby>` as `base[reading]`.
///
/// Readings attach to the preceding run of text in bracket notation, so a
/// kanji base gets a separating space unless one is already there.
pub fn ruby_to_bracket(ruby_html: &str) -> String {
    let cleaned = RP_GROUP.replace_all(ruby_html, "");
    let mut out = String::with_capacity(cleaned.len());
    let mut last = 0;

    for caps in RUBY_GROUP.captures_iter(&cleaned) {
        let (Some(whole), Some(base), Some(reading)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        out.push_str(&cleaned[last..whole.start()]);

        let base = base.as_str();
        let needs_space = out.chars().last().is_some_and(|c| c != ' ');
        if base.chars().any(is_kanji) && needs_space {
            out.push(' ');
        }
        out.push_str(base);
        out.push('[');
        out.push_str(reading.as_str());
        out.push(']');

        last = whole.end();
    }

    out.push_str(&cleaned[last..]);
    out
}
