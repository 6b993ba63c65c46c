//! Soil-test report data model.
//!
//! Every field group serializes all of its keys; a field that was not found
//! is written as `null`, never omitted.

use serde::{Deserialize, Serialize};

/// A single extracted value, viewed uniformly for scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Number(Option<f64>),
}

impl FieldValue<'_> {
    /// Whether the field counts as populated.
    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Text(value) => value.is_some_and(|s| !s.trim().is_empty()),
            FieldValue::Number(value) => value.is_some(),
        }
    }
}

/// A named cluster of extracted attributes with a fixed key set.
pub trait FieldGroup {
    /// Declared field names paired with their current values, in schema order.
    fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)>;

    /// Number of declared fields that are populated.
    fn filled_count(&self) -> usize {
        self.fields().iter().filter(|(_, v)| v.is_filled()).count()
    }
}

/// Farmer identity block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmerDetails {
    pub name: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
}

impl FieldGroup for FarmerDetails {
    fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        vec![
            ("name", FieldValue::Text(self.name.as_deref())),
            ("state", FieldValue::Text(self.state.as_deref())),
            ("district", FieldValue::Text(self.district.as_deref())),
            ("village", FieldValue::Text(self.village.as_deref())),
        ]
    }
}

/// Primary soil metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilMetrics {
    pub nitrogen_kg_ha: Option<f64>,
    pub phosphorus_kg_ha: Option<f64>,
    pub potassium_kg_ha: Option<f64>,
    pub ph: Option<f64>,
    pub organic_carbon_percent: Option<f64>,
    pub ec_ds_m: Option<f64>,
}

impl FieldGroup for SoilMetrics {
    fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        vec![
            ("nitrogen_kg_ha", FieldValue::Number(self.nitrogen_kg_ha)),
            ("phosphorus_kg_ha", FieldValue::Number(self.phosphorus_kg_ha)),
            ("potassium_kg_ha", FieldValue::Number(self.potassium_kg_ha)),
            ("ph", FieldValue::Number(self.ph)),
            ("organic_carbon_percent", FieldValue::Number(self.organic_carbon_percent)),
            ("ec_ds_m", FieldValue::Number(self.ec_ds_m)),
        ]
    }
}

/// Micronutrient readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Micronutrients {
    pub zinc: Option<f64>,
    pub iron: Option<f64>,
    pub boron: Option<f64>,
    pub copper: Option<f64>,
    pub manganese: Option<f64>,
    pub sulfur: Option<f64>,
}

impl FieldGroup for Micronutrients {
    fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        vec![
            ("zinc", FieldValue::Number(self.zinc)),
            ("iron", FieldValue::Number(self.iron)),
            ("boron", FieldValue::Number(self.boron)),
            ("copper", FieldValue::Number(self.copper)),
            ("manganese", FieldValue::Number(self.manganese)),
            ("sulfur", FieldValue::Number(self.sulfur)),
        ]
    }
}

/// Report identifiers and provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub sample_number: Option<String>,
    pub report_date: Option<String>,
    pub lab_name: Option<String>,
}

impl FieldGroup for ReportMetadata {
    fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        vec![
            ("sample_number", FieldValue::Text(self.sample_number.as_deref())),
            ("report_date", FieldValue::Text(self.report_date.as_deref())),
            ("lab_name", FieldValue::Text(self.lab_name.as_deref())),
        ]
    }
}

/// Coarse trust tier derived from the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionAccuracy {
    High,
    Medium,
    Low,
}

/// Complete output of one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Farmer identity.
    pub farmer_details: FarmerDetails,

    /// Primary soil metrics.
    pub soil_metrics: SoilMetrics,

    /// Micronutrient readings.
    pub micronutrients: Micronutrients,

    /// Advisory sentences, at most ten.
    pub advisory: Vec<String>,

    /// Report identifiers.
    pub report_metadata: ReportMetadata,

    /// Weighted completeness in `[0.0, 1.0]`, two decimals.
    pub confidence_score: f64,

    /// Recognized text before normalization.
    pub raw_text: String,

    /// Terminal failure description, if the pipeline stopped early.
    pub error: Option<String>,
}

impl ExtractionResult {
    /// An empty, fully-shaped result carrying only an error.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Whether the pipeline ran to completion.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Trust tier for persisting alongside the extracted values.
    pub fn accuracy(&self) -> ExtractionAccuracy {
        if self.confidence_score >= 0.75 {
            ExtractionAccuracy::High
        } else if self.confidence_score >= 0.4 {
            ExtractionAccuracy::Medium
        } else {
            ExtractionAccuracy::Low
        }
    }
}
