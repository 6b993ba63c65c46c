//! Primary soil metric extraction.
//!
//! Unit tokens that follow a value are matched loosely and dropped; only
//! the number is kept.

use std::sync::Arc;

use super::patterns::{Field, PatternRegistry};
use super::{FieldExtractor, extract_number};
use crate::models::report::SoilMetrics;
use crate::report::normalize::NormalizedText;

/// Soil metrics extractor (N, P, K, pH, organic carbon, EC).
pub struct SoilMetricsExtractor {
    registry: Arc<PatternRegistry>,
}

impl SoilMetricsExtractor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }
}

impl Default for SoilMetricsExtractor {
    fn default() -> Self {
        Self::new(PatternRegistry::standard())
    }
}

impl FieldExtractor for SoilMetricsExtractor {
    type Output = SoilMetrics;

    fn extract(&self, text: &NormalizedText) -> SoilMetrics {
        let text = text.as_str();
        let number = |field| extract_number(text, self.registry.patterns(field));

        SoilMetrics {
            nitrogen_kg_ha: number(Field::Nitrogen),
            phosphorus_kg_ha: number(Field::Phosphorus),
            potassium_kg_ha: number(Field::Potassium),
            ph: number(Field::Ph),
            organic_carbon_percent: number(Field::OrganicCarbon),
            ec_ds_m: number(Field::ElectricalConductivity),
        }
    }
}
