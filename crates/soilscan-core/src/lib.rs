//! Core library for soil-test report OCR.
//!
//! This crate provides:
//! - Image conditioning (deskew, denoise, adaptive threshold)
//! - A text recognition seam with a Tesseract subprocess backend
//! - Text layer extraction for PDF reports
//! - OCR text normalization and field extraction for soil health cards
//! - Weighted confidence scoring and a fail-soft scan pipeline

pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod report;

pub use error::{OcrError, PdfError, PreprocessError, Result, ScanError};
pub use models::config::{ExtractionConfig, OcrConfig, PreprocessConfig, ScanConfig};
pub use models::report::{
    ExtractionAccuracy, ExtractionResult, FarmerDetails, Micronutrients, ReportMetadata, SoilMetrics,
};
pub use ocr::{ConditionedImage, ImagePreprocessor, TesseractRecognizer, TextRecognizer};
pub use pdf::{PdfTextExtractor, is_pdf};
pub use pipeline::{PipelineStage, ReportScanner};
pub use report::{ConfidenceScorer, NormalizedText, SoilReportParser, normalize};
