//! Sentence segmentation

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Splits story text into speakable units
///
/// A unit ends at `.`, `!` or `?` followed by whitespace; the punctuation
/// stays with the unit it ends. Units are trimmed and blank ones dropped.
/// Text without terminal punctuation comes back as a single unit.
pub fn segment(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BREAK.find_iter(text) {
        // the punctuation mark is a single ASCII byte
        push_unit(&mut units, &text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    push_unit(&mut units, &text[start..]);

    units
}

fn push_unit(units: &mut Vec<String>, raw: &str) {
    let unit = raw.trim();
    if !unit.is_empty() {
        units.push(unit.to_string());
    }
}
