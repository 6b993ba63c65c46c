//! Advisory text extraction.
//!
//! Two passes feed one list: sentences pulled from advisory sections and
//! imperative "Apply/Use/Add ..." directives, then any line that mentions
//! a fertilizer or soil amendment keyword.

use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use super::FieldExtractor;
use super::patterns::{Field, PatternRegistry};
use crate::models::config::ExtractionConfig;
use crate::report::normalize::NormalizedText;

/// Words that mark a line as a recommendation, matched whole and ignoring case.
const KEYWORDS: &[&str] = &[
    "apply",
    "use",
    "add",
    "suitable",
    "recommended",
    "maintain",
    "lime",
    "gypsum",
    "zinc",
    "sulphate",
    "urea",
    "dap",
    "mop",
    "compost",
    "fym",
    "organic matter",
];

/// Action words that keep a line even when it reads like a measurement.
const ACTIONS: &[&str] = &["apply", "use", "add", "maintain"];

/// Section sentences must be longer than this (characters).
const MIN_SENTENCE_LEN: usize = 10;

lazy_static! {
    /// Sentence terminator followed by whitespace or end of text, or a line break.
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.;!?]+(?:\s+|$)|\n").unwrap();

    static ref KEYWORD: Regex = word_set(KEYWORDS);

    static ref ACTION: Regex = word_set(ACTIONS);

    /// A label without digits, then one value and an optional unit, e.g.
    /// `Available Zinc (Zn): 0.45 ppm`.
    static ref MEASUREMENT_ROW: Regex = Regex::new(
        r"(?i)^([^\d]*?)\s*[:=\-]?\s*\d+(?:\.\d+)?\s*(?:%|[a-z]+(?:\s*/\s*[a-z]+)?)?$"
    )
    .unwrap();
}

fn word_set(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|word| regex::escape(word)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).unwrap()
}

/// A label/value row that gives no instruction.
fn is_measurement_row(line: &str) -> bool {
    MEASUREMENT_ROW
        .captures(line)
        .and_then(|caps| caps.get(1))
        .is_some_and(|label| !ACTION.is_match(label.as_str()))
}

/// Advisory list extractor.
pub struct AdvisoryExtractor {
    registry: Arc<PatternRegistry>,
    max_entries: usize,
    min_line_len: usize,
    max_line_len: usize,
}

impl AdvisoryExtractor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        let defaults = ExtractionConfig::default();
        Self {
            registry,
            max_entries: defaults.max_advisories,
            min_line_len: defaults.min_advisory_line_len,
            max_line_len: defaults.max_advisory_line_len,
        }
    }

    /// Apply the advisory limits from `config`.
    pub fn with_config(mut self, config: &ExtractionConfig) -> Self {
        self.max_entries = config.max_advisories;
        self.min_line_len = config.min_advisory_line_len;
        self.max_line_len = config.max_advisory_line_len;
        self
    }

    fn section_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();

        for pattern in self.registry.patterns(Field::AdvisorySection) {
            for caps in pattern.captures_iter(text) {
                if let Some(block) = caps.get(1).or_else(|| caps.get(0)) {
                    sentences.extend(split_sentences(block.as_str()));
                }
            }
        }

        for pattern in self.registry.patterns(Field::AdvisoryDirective) {
            for found in pattern.find_iter(text) {
                sentences.extend(split_sentences(found.as_str()));
            }
        }

        sentences
    }

    fn keyword_lines(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(|line| line.trim().trim_end_matches(['.', ';']))
            .filter(|line| {
                let len = line.chars().count();
                len > self.min_line_len && len < self.max_line_len
            })
            .filter(|line| KEYWORD.is_match(line) && !is_measurement_row(line))
            .map(str::to_string)
            .collect()
    }
}

impl Default for AdvisoryExtractor {
    fn default() -> Self {
        Self::new(PatternRegistry::standard())
    }
}

impl FieldExtractor for AdvisoryExtractor {
    type Output = Vec<String>;

    fn extract(&self, text: &NormalizedText) -> Vec<String> {
        let text = text.as_str();
        let mut advisories = self.section_sentences(text);
        advisories.extend(self.keyword_lines(text));

        let mut advisories = dedupe_case_insensitive(advisories);
        advisories.truncate(self.max_entries);
        advisories
    }
}

/// Split a block into trimmed candidate sentences, dropping short fragments
/// and form placeholders (`"__..."`).
pub fn split_sentences(block: &str) -> Vec<String> {
    SENTENCE_BREAK
        .split(block)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_LEN && !s.starts_with("__"))
        .map(str::to_string)
        .collect()
}

/// Drop entries that repeat an earlier one ignoring case. The first-seen
/// spelling is kept.
pub fn dedupe_case_insensitive(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.to_lowercase()))
        .collect()
}
