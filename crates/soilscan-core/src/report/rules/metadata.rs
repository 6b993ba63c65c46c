//! Report identifier and provenance extraction.

use std::sync::Arc;

use super::patterns::{Field, PatternRegistry};
use super::{FieldExtractor, extract_capture};
use crate::models::report::ReportMetadata;
use crate::report::normalize::NormalizedText;

/// Report metadata extractor.
///
/// Dates are kept as printed; a labeled date is preferred over the first
/// bare day/month/year in the text.
pub struct MetadataExtractor {
    registry: Arc<PatternRegistry>,
}

impl MetadataExtractor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(PatternRegistry::standard())
    }
}

impl FieldExtractor for MetadataExtractor {
    type Output = ReportMetadata;

    fn extract(&self, text: &NormalizedText) -> ReportMetadata {
        let text = text.as_str();
        let capture = |field| extract_capture(text, self.registry.patterns(field));

        ReportMetadata {
            sample_number: capture(Field::SampleNumber),
            report_date: capture(Field::ReportDate),
            lab_name: capture(Field::LabName),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::normalize::normalize;
    use pretty_assertions::assert_eq;

    fn extract(raw: &str) -> ReportMetadata {
        MetadataExtractor::default().extract(&normalize(raw))
    }

    #[test]
    fn test_labeled_metadata() {
        let meta = extract(
            "District Soil Testing Laboratory, Mandya\n\
             Sample No.: KA/MDY/2023/0456\n\
             Collected 02/01/2023\n\
             Report Date: 15-01-2023",
        );
        assert_eq!(
            meta,
            ReportMetadata {
                sample_number: Some("KA/MDY/2023/0456".to_string()),
                report_date: Some("15-01-2023".to_string()),
                lab_name: Some("Soil Testing Laboratory".to_string()),
            }
        );
    }

    #[test]
    fn test_bare_date_fallback() {
        let meta = extract("Tested on 5/3/24 at Krishi Vigyan Kendra");
        assert_eq!(meta.report_date.as_deref(), Some("5/3/24"));
        assert_eq!(meta.lab_name.as_deref(), Some("Krishi Vigyan Kendra"));
        assert_eq!(meta.sample_number, None);
    }

    #[test]
    fn test_report_number_as_sample_id() {
        let meta = extract("Report Number - SHC-1187");
        assert_eq!(meta.sample_number.as_deref(), Some("SHC-1187"));
    }

    #[test]
    fn test_year_inside_identifier_is_not_a_date() {
        let meta = extract("Sample ID: 2023/0456");
        assert_eq!(meta.report_date, None);
    }
}
