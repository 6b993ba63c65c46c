//! Farmer identity extraction.

use std::sync::Arc;

use super::patterns::{Field, PatternRegistry};
use super::{FieldExtractor, extract_capture};
use crate::models::report::FarmerDetails;
use crate::report::normalize::NormalizedText;

/// Label words that end a captured value when fields share a line.
const LABEL_WORDS: &[&str] = &[
    "name", "farmer", "father", "state", "district", "dist", "village", "taluk", "mandal",
    "block", "sample", "date", "mobile", "phone", "survey",
];

/// Farmer details extractor.
pub struct FarmerExtractor {
    registry: Arc<PatternRegistry>,
}

impl FarmerExtractor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    fn field(&self, field: Field, text: &str) -> Option<String> {
        extract_capture(text, self.registry.patterns(field))
            .and_then(|value| cut_at_label(&value))
    }
}

impl Default for FarmerExtractor {
    fn default() -> Self {
        Self::new(PatternRegistry::standard())
    }
}

impl FieldExtractor for FarmerExtractor {
    type Output = FarmerDetails;

    fn extract(&self, text: &NormalizedText) -> FarmerDetails {
        let text = text.as_str();
        FarmerDetails {
            name: self.field(Field::Name, text),
            state: self.field(Field::State, text),
            district: self.field(Field::District, text),
            village: self.field(Field::Village, text),
        }
    }
}

/// Keep the words before the first label word, e.g. `"Ramesh Village"` ->
/// `"Ramesh"`. Returns `None` if nothing is left.
fn cut_at_label(value: &str) -> Option<String> {
    let words: Vec<&str> = value
        .split_whitespace()
        .take_while(|word| {
            let bare = word.trim_end_matches(['.', ':']).to_ascii_lowercase();
            !LABEL_WORDS.contains(&bare.as_str())
        })
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::normalize::normalize;
    use pretty_assertions::assert_eq;

    fn extract(raw: &str) -> FarmerDetails {
        FarmerExtractor::default().extract(&normalize(raw))
    }

    #[test]
    fn test_labeled_fields() {
        let details = extract(
            "Farmer Name: Ramesh Kumar\nState: Karnataka\nDistrict: Mysuru\nVillage: Hunsur",
        );
        assert_eq!(
            details,
            FarmerDetails {
                name: Some("Ramesh Kumar".to_string()),
                state: Some("Karnataka".to_string()),
                district: Some("Mysuru".to_string()),
                village: Some("Hunsur".to_string()),
            }
        );
    }

    #[test]
    fn test_fields_sharing_a_line() {
        let details = extract("Name: Lakshmi Devi Village: Kollur Dist: Udupi");
        assert_eq!(details.name.as_deref(), Some("Lakshmi Devi"));
        assert_eq!(details.village.as_deref(), Some("Kollur"));
        assert_eq!(details.district.as_deref(), Some("Udupi"));
    }

    #[test]
    fn test_state_whitelist_fallback() {
        let details = extract("Soil Health Card, Government of Tamil Nadu");
        assert_eq!(details.state.as_deref(), Some("Tamil Nadu"));
    }

    #[test]
    fn test_farmer_label_preferred_over_generic_name() {
        let details = extract("Lab Name: Central Lab\nName of Farmer: Suresh Patil");
        assert_eq!(details.name.as_deref(), Some("Suresh Patil"));
    }

    #[test]
    fn test_taluk_fills_village() {
        let details = extract("Taluk: Hunsur");
        assert_eq!(details.village.as_deref(), Some("Hunsur"));
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(extract("pH: 6.5"), FarmerDetails::default());
    }

    #[test]
    fn test_cut_at_label() {
        assert_eq!(cut_at_label("Ramesh Kumar Mobile"), Some("Ramesh Kumar".to_string()));
        assert_eq!(cut_at_label("Village"), None);
        assert_eq!(cut_at_label("Mysuru"), Some("Mysuru".to_string()));
    }
}
