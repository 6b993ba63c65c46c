//! Rule-based field-group extractors for soil reports.

pub mod advisory;
pub mod farmer;
pub mod metadata;
pub mod metrics;
pub mod micronutrients;
pub mod patterns;

pub use advisory::{AdvisoryExtractor, dedupe_case_insensitive, split_sentences};
pub use farmer::FarmerExtractor;
pub use metadata::MetadataExtractor;
pub use metrics::SoilMetricsExtractor;
pub use micronutrients::MicronutrientExtractor;
pub use patterns::{Field, PatternRegistry};

use regex::Regex;
use tracing::trace;

use super::normalize::NormalizedText;

/// Trait for field-group extractors.
///
/// Extraction never fails: a field that no alternative matches is left
/// empty and the rest of the group is still filled in.
pub trait FieldExtractor {
    /// The field group this extractor produces.
    type Output: Default;

    /// Extract the group from normalized text.
    fn extract(&self, text: &NormalizedText) -> Self::Output;
}

/// First number captured by `patterns`, tried in order.
///
/// Everything except digits and `.` is stripped from group 1 before parsing.
/// A capture that still does not parse moves on to the next pattern.
pub fn extract_number(text: &str, patterns: &[Regex]) -> Option<f64> {
    for (index, pattern) in patterns.iter().enumerate() {
        let Some(raw) = pattern.captures(text).and_then(|caps| caps.get(1)) else {
            continue;
        };

        let cleaned: String = raw
            .as_str()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        match cleaned.parse::<f64>() {
            Ok(value) => {
                trace!(pattern = index, value, "Numeric pattern hit");
                return Some(value);
            }
            Err(_) => {
                trace!(pattern = index, raw = raw.as_str(), "Unparseable capture, trying next pattern");
            }
        }
    }
    None
}

/// First non-empty capture from `patterns`, tried in order.
///
/// Uses group 1 when the pattern has one and the whole match otherwise.
/// The value is trimmed.
pub fn extract_capture(text: &str, patterns: &[Regex]) -> Option<String> {
    for (index, pattern) in patterns.iter().enumerate() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let Some(matched) = caps.get(1).or_else(|| caps.get(0)) else {
            continue;
        };

        let value = matched.as_str().trim();
        if !value.is_empty() {
            trace!(pattern = index, value, "Text pattern hit");
            return Some(value.to_string());
        }
    }
    None
}
