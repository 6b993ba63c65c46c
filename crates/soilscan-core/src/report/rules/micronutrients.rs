//! Micronutrient extraction.

use std::sync::Arc;

use super::patterns::{Field, PatternRegistry};
use super::{FieldExtractor, extract_number};
use crate::models::report::Micronutrients;
use crate::report::normalize::NormalizedText;

/// Micronutrient extractor (Zn, Fe, B, Cu, Mn, S).
pub struct MicronutrientExtractor {
    registry: Arc<PatternRegistry>,
}

impl MicronutrientExtractor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }
}

impl Default for MicronutrientExtractor {
    fn default() -> Self {
        Self::new(PatternRegistry::standard())
    }
}

impl FieldExtractor for MicronutrientExtractor {
    type Output = Micronutrients;

    fn extract(&self, text: &NormalizedText) -> Micronutrients {
        let text = text.as_str();
        let number = |field| extract_number(text, self.registry.patterns(field));

        Micronutrients {
            zinc: number(Field::Zinc),
            iron: number(Field::Iron),
            boron: number(Field::Boron),
            copper: number(Field::Copper),
            manganese: number(Field::Manganese),
            sulfur: number(Field::Sulfur),
        }
    }
}
