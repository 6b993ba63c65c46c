//! OCR text normalization.
//!
//! Repairs systematic recognition errors before any field is extracted:
//! misread unit strings, letters standing in for digits, and ragged
//! whitespace. Line structure is kept so label/value pairs stay on their
//! own lines.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

/// Known misreadings of unit strings, applied in order as literal replacements.
const UNIT_CORRECTIONS: &[(&str, &str)] = &[
    ("kq/ha", "kg/ha"),
    ("kglha", "kg/ha"),
    ("kg /ha", "kg/ha"),
    ("kg/ ha", "kg/ha"),
    ("pprn", "ppm"),
    ("ppnn", "ppm"),
    ("dS/rn", "dS/m"),
    ("dSlm", "dS/m"),
    ("meq/l00g", "meq/100g"),
    ("rneq/100g", "meq/100g"),
];

lazy_static! {
    /// Capital O between two digits.
    static ref LETTER_O_IN_NUMBER: Regex = Regex::new(r"(\d)O(\d)").unwrap();

    /// Lowercase l directly before a digit.
    static ref LETTER_L_BEFORE_DIGIT: Regex = Regex::new(r"l(\d)").unwrap();

    /// Any whitespace run that does not contain a newline.
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[^\S\n]+").unwrap();
}

/// Recognized text after deterministic corrections.
///
/// Read-only input shared by every field extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize raw recognized text.
///
/// The correction pass is repeated until it no longer changes the text, so
/// `normalize(normalize(x).as_str()) == normalize(x)`. Every pass that makes a
/// change either shortens the text or removes one of the letters `q`, `l`, `O`
/// without introducing another, so the loop terminates.
pub fn normalize(raw: &str) -> NormalizedText {
    let mut current = correction_pass(raw);
    loop {
        let next = correction_pass(&current);
        if next == current {
            return NormalizedText(current);
        }
        current = next;
    }
}

fn correction_pass(text: &str) -> String {
    let mut text = text.to_string();
    for (wrong, right) in UNIT_CORRECTIONS {
        if text.contains(wrong) {
            text = text.replace(wrong, right);
        }
    }

    let text = LETTER_O_IN_NUMBER.replace_all(&text, "${1}0${2}");
    let text = LETTER_L_BEFORE_DIGIT.replace_all(&text, "1${1}");

    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
