//! Soil report parser: runs every field-group extractor over normalized text.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::confidence::ConfidenceScorer;
use super::normalize::NormalizedText;
use super::rules::{
    AdvisoryExtractor, FarmerExtractor, FieldExtractor, MetadataExtractor,
    MicronutrientExtractor, PatternRegistry, SoilMetricsExtractor,
};
use crate::error::{ScanError, panic_message};
use crate::models::config::ExtractionConfig;
use crate::models::report::{ExtractionResult, FieldGroup};

/// Extracts all field groups from recognized report text.
pub struct SoilReportParser {
    farmer: FarmerExtractor,
    metrics: SoilMetricsExtractor,
    micronutrients: MicronutrientExtractor,
    advisory: AdvisoryExtractor,
    metadata: MetadataExtractor,
    scorer: ConfidenceScorer,
}

impl SoilReportParser {
    /// Create a parser over the built-in pattern registry.
    pub fn new() -> Self {
        Self::with_registry(PatternRegistry::standard())
    }

    /// Create a parser over a custom pattern registry.
    pub fn with_registry(registry: Arc<PatternRegistry>) -> Self {
        Self {
            farmer: FarmerExtractor::new(Arc::clone(&registry)),
            metrics: SoilMetricsExtractor::new(Arc::clone(&registry)),
            micronutrients: MicronutrientExtractor::new(Arc::clone(&registry)),
            advisory: AdvisoryExtractor::new(Arc::clone(&registry)),
            metadata: MetadataExtractor::new(registry),
            scorer: ConfidenceScorer::default(),
        }
    }

    /// Create a parser from extraction settings. User patterns are appended
    /// to the built-in ones.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ScanError> {
        let registry = if config.extra_patterns.is_empty() {
            PatternRegistry::standard()
        } else {
            Arc::new(PatternRegistry::standard().with_extra(&config.extra_patterns)?)
        };

        let mut parser = Self::with_registry(registry);
        parser.advisory = parser.advisory.with_config(config);
        Ok(parser)
    }

    /// Set the confidence weights.
    pub fn with_scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Run every field-group extractor and store each group in `result` as
    /// soon as it is done.
    ///
    /// A routine that panics leaves its group empty; the others still run.
    /// Returns the panic messages, in routine order.
    pub fn extract_into(&self, text: &NormalizedText, result: &mut ExtractionResult) -> Vec<String> {
        let start = Instant::now();
        let mut failures = Vec::new();

        result.farmer_details = guarded("farmer_details", &mut failures, || self.farmer.extract(text));
        result.soil_metrics = guarded("soil_metrics", &mut failures, || self.metrics.extract(text));
        result.micronutrients =
            guarded("micronutrients", &mut failures, || self.micronutrients.extract(text));
        result.advisory = guarded("advisory", &mut failures, || self.advisory.extract(text));
        result.report_metadata = guarded("report_metadata", &mut failures, || self.metadata.extract(text));

        debug!(
            farmer_details = result.farmer_details.filled_count(),
            soil_metrics = result.soil_metrics.filled_count(),
            micronutrients = result.micronutrients.filled_count(),
            advisory = result.advisory.len(),
            report_metadata = result.report_metadata.filled_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extracted field groups"
        );

        failures
    }

    /// Confidence score for the groups currently in `result`.
    pub fn score(&self, result: &ExtractionResult) -> f64 {
        let score = self.scorer.score(result);
        info!(confidence = score, "Scored extraction");
        score
    }
}

impl Default for SoilReportParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one extraction routine, turning a panic into a default group and a
/// recorded failure.
fn guarded<T: Default>(group: &str, failures: &mut Vec<String>, routine: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(routine)) {
        Ok(value) => value,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(group, error = %message, "Extraction routine panicked");
            failures.push(message);
            T::default()
        }
    }
}
