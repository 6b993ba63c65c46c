//! Pattern registry for soil report extraction.
//!
//! Every extractable field owns an ordered list of compiled alternatives.
//! Extractors try them in order and stop at the first one that yields a
//! value, so an earlier alternative wins even when a later one would match
//! earlier in the text.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ScanError;

/// Every field the extractors know how to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Farmer details
    Name,
    State,
    District,
    Village,

    // Soil metrics
    Nitrogen,
    Phosphorus,
    Potassium,
    Ph,
    OrganicCarbon,
    ElectricalConductivity,

    // Micronutrients
    Zinc,
    Iron,
    Boron,
    Copper,
    Manganese,
    Sulfur,

    // Report metadata
    SampleNumber,
    ReportDate,
    LabName,

    // Advisory passes
    AdvisorySection,
    AdvisoryDirective,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::Name,
        Field::State,
        Field::District,
        Field::Village,
        Field::Nitrogen,
        Field::Phosphorus,
        Field::Potassium,
        Field::Ph,
        Field::OrganicCarbon,
        Field::ElectricalConductivity,
        Field::Zinc,
        Field::Iron,
        Field::Boron,
        Field::Copper,
        Field::Manganese,
        Field::Sulfur,
        Field::SampleNumber,
        Field::ReportDate,
        Field::LabName,
        Field::AdvisorySection,
        Field::AdvisoryDirective,
    ];

    /// Key used in the result JSON and in configuration files.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::State => "state",
            Field::District => "district",
            Field::Village => "village",
            Field::Nitrogen => "nitrogen_kg_ha",
            Field::Phosphorus => "phosphorus_kg_ha",
            Field::Potassium => "potassium_kg_ha",
            Field::Ph => "ph",
            Field::OrganicCarbon => "organic_carbon_percent",
            Field::ElectricalConductivity => "ec_ds_m",
            Field::Zinc => "zinc",
            Field::Iron => "iron",
            Field::Boron => "boron",
            Field::Copper => "copper",
            Field::Manganese => "manganese",
            Field::Sulfur => "sulfur",
            Field::SampleNumber => "sample_number",
            Field::ReportDate => "report_date",
            Field::LabName => "lab_name",
            Field::AdvisorySection => "advisory_section",
            Field::AdvisoryDirective => "advisory_directive",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Built-in alternatives per field, in priority order.
///
/// Numeric patterns capture the value in group 1 as digits with at most one
/// decimal part, so a sentence-ending period is never taken. Abbreviations
/// are word-bounded and longer spellings come before their prefixes.
const BUILTIN_PATTERNS: &[(Field, &[&str])] = &[
    (
        Field::Name,
        &[
            r"(?i)(?:Farmer\s*Name|Name\s*of\s*(?:the\s*)?Farmer)[:\-\s]+([A-Z][A-Za-z .]{2,30})",
            r"(?i)\bName\b[:\-\s]+([A-Z][A-Za-z .]{2,30})",
        ],
    ),
    (
        Field::State,
        &[
            r"(?i)\bState\b[:\-\s]+([A-Za-z ]{4,30})",
            r"(?i)\b(Karnataka|Tamil\s*Nadu|Telangana|Maharashtra|Kerala|Andhra\s*Pradesh|Punjab|Haryana)\b",
        ],
    ),
    (
        Field::District,
        &[
            r"(?i)\bDistrict\b[:\-\s]+([A-Za-z ]{3,30})",
            r"(?i)\bDist\b\.?[:\-\s]+([A-Za-z ]{3,30})",
        ],
    ),
    (
        Field::Village,
        &[
            r"(?i)\bVillage\b[:\-\s]+([A-Za-z ]{2,30})",
            r"(?i)\bTaluk\b[:\-\s]+([A-Za-z ]{2,30})",
        ],
    ),
    (
        Field::Nitrogen,
        &[
            r"(?i)(?:Available\s*)?(?:\bNitrogen\b|\bN\b)\s*(?:\(\s*N\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)\bN\b\s*[:\-=]\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bNitrogen\b|\bN\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Phosphorus,
        &[
            r"(?i)(?:Available\s*)?(?:\bPhosphorus\b|\bPhosphorous\b|\bP2[O0]5\b|\bP\b)\s*(?:\(\s*(?:P2[O0]5|P)\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)\bP\b\s*[:\-=]\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bPhosphor(?:us|ous)\b|\bP2[O0]5\b|\bP\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Potassium,
        &[
            r"(?i)(?:Available\s*)?(?:\bPotassium\b|\bK2[O0]\b|\bK\b)\s*(?:\(\s*(?:K2[O0]|K{1,2})\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)\bK\b\s*[:\-=]\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bPotassium\b|\bK2[O0]\b|\bK\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Ph,
        &[
            r"(?i)\bpH\b\s*[:\-=]?\s*(?:level|value)?\s*[:\-]?\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bSoil\s*Reaction\b|\bpH\b)\s*(?:\(\s*pH\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)\bpH\b\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::OrganicCarbon,
        &[
            r"(?i)(?:\bOrganic\s*Carbon\b|\bOrg[.\s]*Carbon\b)\s*(?:\(\s*(?:OC|%)\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)\bO\.?\s?C\b\.?\s*(?:\(\s*%\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)\bOrganic\b\s+(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::ElectricalConductivity,
        &[
            r"(?i)(?:\bElectrical\s*Conductivity\b|\bE\.C\b\.?|\bEC\b)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bElectrical\s*Conductivity\b|\bE\.?C\b\.?)\s*\(\s*dS\s*/\s*m\s*\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Zinc,
        &[
            r"(?i)(?:Available\s*)?(?:\bZinc\b|\bZn\b)\s*(?:\(\s*Zn\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bZinc\b|\bZn\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Iron,
        &[
            r"(?i)(?:Available\s*)?(?:\bIron\b|\bFe\b)\s*(?:\(\s*Fe\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bIron\b|\bFe\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Boron,
        &[
            r"(?i)(?:Available\s*)?(?:\bBoron\b|\bB\b)\s*(?:\(\s*B\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bBoron\b|\bB\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Copper,
        &[
            r"(?i)(?:Available\s*)?(?:\bCopper\b|\bCu\b)\s*(?:\(\s*Cu\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bCopper\b|\bCu\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Manganese,
        &[
            r"(?i)(?:Available\s*)?(?:\bManganese\b|\bMn\b)\s*(?:\(\s*Mn\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bManganese\b|\bMn\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::Sulfur,
        &[
            r"(?i)(?:Available\s*)?(?:\bSulfur\b|\bSulphur\b|\bS\b)\s*(?:\(\s*S\s*\))?\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
            r"(?i)(?:\bSulph?ur\b|\bS\b)\s*\([^)\n]{1,15}\)\s*[:\-=]?\s*(\d+(?:\.\d+)?)",
        ],
    ),
    (
        Field::SampleNumber,
        &[
            r"(?i)(?:Sample\s*(?:No\.?|Number|ID)|Report\s*(?:No\.?|Number))[:\-\s]+([A-Z0-9\-/]+)",
        ],
    ),
    (
        Field::ReportDate,
        &[
            r"(?i)(?:Report\s*Date|\bDate(?:\s*of\s*[A-Za-z]+)?)[:\-\s]+(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})\b",
            r"\b(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})\b",
        ],
    ),
    (
        Field::LabName,
        &[
            r"(?i)\b(Soil\s*Testing\s*Lab(?:oratory)?)\b",
            r"(?i)\b(Department\s*of\s*Agriculture)\b",
            r"(?i)\b(Krishi\s*Vigyan\s*Kendra)\b",
            r"(?i)\b(Agricultural\s*Research\s*Station)\b",
        ],
    ),
    (
        Field::AdvisorySection,
        &[r"(?is)\b(?:Advisory|Advisories|Recommendations?|Remarks|Suggestions?)\s*[:\-]?\s*(.+)"],
    ),
    (
        Field::AdvisoryDirective,
        &[r"(?i)\b(?:Apply|Use|Add)[ \t]+[^\n]+"],
    ),
];

lazy_static! {
    static ref STANDARD: Arc<PatternRegistry> =
        Arc::new(PatternRegistry::compile(BUILTIN_PATTERNS).unwrap());
}

/// Immutable mapping from field to its ordered pattern alternatives.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    patterns: HashMap<Field, Vec<Regex>>,
}

impl PatternRegistry {
    /// The built-in registry, compiled once and shared.
    pub fn standard() -> Arc<PatternRegistry> {
        Arc::clone(&STANDARD)
    }

    /// Compile a table of `(field, patterns)` entries.
    pub fn compile(table: &[(Field, &[&str])]) -> Result<Self, regex::Error> {
        let mut registry = Self::default();
        for (field, sources) in table {
            for source in *sources {
                registry.push(*field, Regex::new(source)?);
            }
        }
        Ok(registry)
    }

    /// Append an alternative after the existing ones for `field`.
    pub fn push(&mut self, field: Field, pattern: Regex) {
        self.patterns.entry(field).or_default().push(pattern);
    }

    /// Alternatives for `field`, in priority order.
    pub fn patterns(&self, field: Field) -> &[Regex] {
        self.patterns.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A copy of this registry with user patterns appended after the
    /// existing alternatives. Keys are field keys as in [`Field::key`].
    pub fn with_extra(&self, extra: &HashMap<String, Vec<String>>) -> Result<Self, ScanError> {
        let mut registry = self.clone();

        // Sorted so the first reported problem does not depend on map order.
        let mut keys: Vec<&String> = extra.keys().collect();
        keys.sort();

        for key in keys {
            let field = Field::from_key(key)
                .ok_or_else(|| ScanError::Config(format!("unknown field '{key}' in extra_patterns")))?;
            for source in &extra[key] {
                let pattern = Regex::new(source).map_err(|e| {
                    ScanError::Config(format!("invalid pattern for '{key}': {e}"))
                })?;
                registry.push(field, pattern);
            }
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_patterns() {
        let registry = PatternRegistry::standard();
        for field in Field::ALL {
            assert!(!registry.patterns(field).is_empty(), "no patterns for {field}");
        }
    }

    #[test]
    fn test_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("texture"), None);
    }

    #[test]
    fn test_standard_registry_is_shared() {
        assert!(Arc::ptr_eq(
            &PatternRegistry::standard(),
            &PatternRegistry::standard()
        ));
    }

    #[test]
    fn test_extra_patterns_are_appended() {
        let standard = PatternRegistry::standard();
        let mut extra = HashMap::new();
        extra.insert("ph".to_string(), vec![r"(?i)acidity\s*(\d+(?:\.\d+)?)".to_string()]);

        let registry = standard.with_extra(&extra).unwrap();
        let builtin = standard.patterns(Field::Ph).len();
        assert_eq!(registry.patterns(Field::Ph).len(), builtin + 1);
        assert_eq!(
            registry.patterns(Field::Ph)[builtin].as_str(),
            r"(?i)acidity\s*(\d+(?:\.\d+)?)"
        );
    }

    #[test]
    fn test_unknown_extra_key_is_config_error() {
        let mut extra = HashMap::new();
        extra.insert("texture".to_string(), vec!["loam".to_string()]);

        let err = PatternRegistry::standard().with_extra(&extra).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
        assert!(err.to_string().contains("texture"));
    }

    #[test]
    fn test_invalid_extra_pattern_is_config_error() {
        let mut extra = HashMap::new();
        extra.insert("zinc".to_string(), vec!["(unclosed".to_string()]);

        let err = PatternRegistry::standard().with_extra(&extra).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error: invalid pattern for 'zinc'"));
    }

    #[test]
    fn test_abbreviations_are_word_bounded() {
        let registry = PatternRegistry::standard();
        let nitrogen = &registry.patterns(Field::Nitrogen)[0];
        assert!(!nitrogen.is_match("Iron: 8.5"));
        assert!(nitrogen.is_match("N: 240"));
    }

    #[test]
    fn test_numeric_capture_stops_before_sentence_period() {
        let registry = PatternRegistry::standard();
        let ph = registry.patterns(Field::Ph)[0]
            .captures("Soil pH: 6.5. EC: 0.3 dS/m.")
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str());
        assert_eq!(ph, Some("6.5"));
    }
}
