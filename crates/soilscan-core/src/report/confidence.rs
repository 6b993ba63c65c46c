//! Weighted completeness scoring.

use crate::models::report::{ExtractionResult, FieldGroup};

/// Per-group field weights. Every declared field adds its group weight to
/// the denominator, and again to the numerator when it is populated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceScorer {
    pub farmer_details: f64,
    pub soil_metrics: f64,
    pub micronutrients: f64,
    pub report_metadata: f64,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self {
            farmer_details: 1.0,
            soil_metrics: 2.0,
            micronutrients: 1.0,
            report_metadata: 0.5,
        }
    }
}

impl ConfidenceScorer {
    /// Score the field groups of `result` in `[0.0, 1.0]`, two decimals.
    ///
    /// Advisory entries do not take part.
    pub fn score(&self, result: &ExtractionResult) -> f64 {
        let groups: [(&dyn FieldGroup, f64); 4] = [
            (&result.farmer_details, self.farmer_details),
            (&result.soil_metrics, self.soil_metrics),
            (&result.micronutrients, self.micronutrients),
            (&result.report_metadata, self.report_metadata),
        ];
        weighted_completeness(&groups)
    }
}

/// Weighted share of populated fields in `[0.0, 1.0]`, rounded to two
/// decimals. Negative or non-finite weights count as zero. Returns 0.0 when
/// no weighted fields are declared.
pub fn weighted_completeness(groups: &[(&dyn FieldGroup, f64)]) -> f64 {
    let mut filled = 0.0;
    let mut total = 0.0;

    for &(group, weight) in groups {
        let weight = if weight.is_finite() && weight > 0.0 { weight } else { 0.0 };
        total += group.fields().len() as f64 * weight;
        filled += group.filled_count() as f64 * weight;
    }

    let share = filled / total;
    if !share.is_finite() {
        return 0.0;
    }
    (share.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{FieldValue, SoilMetrics};

    struct NoFields;

    impl FieldGroup for NoFields {
        fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)> {
            Vec::new()
        }
    }

    #[test]
    fn test_empty_result_scores_zero() {
        assert_eq!(ConfidenceScorer::default().score(&ExtractionResult::default()), 0.0);
    }

    #[test]
    fn test_no_declared_fields_scores_zero() {
        let groups: [(&dyn FieldGroup, f64); 1] = [(&NoFields, 1.0)];
        assert_eq!(weighted_completeness(&groups), 0.0);
    }

    #[test]
    fn test_soil_metrics_weigh_double() {
        let mut result = ExtractionResult::default();
        result.soil_metrics.ph = Some(6.5);
        let metric_only = ConfidenceScorer::default().score(&result);

        let mut result = ExtractionResult::default();
        result.micronutrients.zinc = Some(1.2);
        let micro_only = ConfidenceScorer::default().score(&result);

        // 2 / 23.5 and 1 / 23.5
        assert_eq!(metric_only, 0.09);
        assert_eq!(micro_only, 0.04);
    }

    #[test]
    fn test_complete_result_scores_one() {
        let mut result = ExtractionResult::default();
        result.farmer_details.name = Some("Ramesh".into());
        result.farmer_details.state = Some("Karnataka".into());
        result.farmer_details.district = Some("Mysuru".into());
        result.farmer_details.village = Some("Hunsur".into());
        result.soil_metrics = SoilMetrics {
            nitrogen_kg_ha: Some(1.0),
            phosphorus_kg_ha: Some(1.0),
            potassium_kg_ha: Some(1.0),
            ph: Some(1.0),
            organic_carbon_percent: Some(1.0),
            ec_ds_m: Some(1.0),
        };
        result.micronutrients.zinc = Some(1.0);
        result.micronutrients.iron = Some(1.0);
        result.micronutrients.boron = Some(1.0);
        result.micronutrients.copper = Some(1.0);
        result.micronutrients.manganese = Some(1.0);
        result.micronutrients.sulfur = Some(1.0);
        result.report_metadata.sample_number = Some("S1".into());
        result.report_metadata.report_date = Some("01/01/2024".into());
        result.report_metadata.lab_name = Some("Soil Testing Laboratory".into());

        assert_eq!(ConfidenceScorer::default().score(&result), 1.0);
    }

    #[test]
    fn test_score_never_decreases_as_fields_fill() {
        let scorer = ConfidenceScorer::default();
        let mut result = ExtractionResult::default();
        let mut previous = scorer.score(&result);

        let steps: [fn(&mut ExtractionResult); 7] = [
            |r| r.report_metadata.lab_name = Some("Department of Agriculture".into()),
            |r| r.farmer_details.name = Some("Ramesh".into()),
            |r| r.soil_metrics.nitrogen_kg_ha = Some(240.0),
            |r| r.micronutrients.boron = Some(0.5),
            |r| r.soil_metrics.ec_ds_m = Some(0.3),
            |r| r.report_metadata.report_date = Some("12/03/2023".into()),
            |r| r.farmer_details.village = Some("Hunsur".into()),
        ];

        for step in steps {
            step(&mut result);
            let current = scorer.score(&result);
            assert!(current >= previous, "{current} < {previous}");
            previous = current;
        }
    }

    #[test]
    fn test_advisory_does_not_count() {
        let mut result = ExtractionResult::default();
        result.advisory = vec!["Apply lime at 2 t/ha".to_string()];
        assert_eq!(ConfidenceScorer::default().score(&result), 0.0);
    }

    #[test]
    fn test_unusable_weights_keep_score_in_range() {
        let scorer = ConfidenceScorer {
            farmer_details: -5.0,
            soil_metrics: 2.0,
            micronutrients: f64::NAN,
            report_metadata: f64::INFINITY,
        };
        let mut result = ExtractionResult::default();
        result.farmer_details.name = Some("Ramesh".into());
        result.soil_metrics.ph = Some(6.5);
        result.report_metadata.lab_name = Some("Soil Testing Laboratory".into());

        // Only soil metrics carry weight: 1 of 6 fields.
        assert_eq!(scorer.score(&result), 0.17);

        let all_negative = ConfidenceScorer {
            farmer_details: -1.0,
            soil_metrics: -1.0,
            micronutrients: -1.0,
            report_metadata: -1.0,
        };
        assert_eq!(all_negative.score(&result), 0.0);
    }
}
