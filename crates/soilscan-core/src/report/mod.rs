//! Soil report text processing: normalization, field extraction and scoring.

pub mod confidence;
pub mod normalize;
mod parser;
pub mod rules;

pub use confidence::ConfidenceScorer;
pub use normalize::{NormalizedText, normalize};
pub use parser::SoilReportParser;
