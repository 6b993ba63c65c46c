//! Configuration structures for the scan pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration for the soilscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Recognizer configuration.
    pub ocr: OcrConfig,

    /// Image conditioning configuration.
    pub preprocessing: PreprocessConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Tesseract recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path or name of the `tesseract` executable.
    pub tesseract_path: PathBuf,

    /// OCR engine mode (`--oem`).
    pub engine_mode: u8,

    /// Page segmentation mode (`--psm`). 6 = a single uniform block of text.
    pub page_segmentation_mode: u8,

    /// Language model (`-l`).
    pub language: String,

    /// Override for the tessdata directory.
    pub tessdata_dir: Option<PathBuf>,

    /// Upper bound on a single recognition call, in seconds.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::from("tesseract"),
            engine_mode: 3,
            page_segmentation_mode: 6,
            language: "eng".to_string(),
            tessdata_dir: None,
            timeout_secs: 60,
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Image conditioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Straighten rotated scans.
    pub deskew: bool,

    /// Skew below this magnitude (degrees) is left alone.
    pub min_skew_degrees: f64,

    /// Non-local-means filter strength.
    pub denoise_strength: f32,

    /// Side of the patch compared by the denoiser (odd).
    pub denoise_template_window: u32,

    /// Side of the neighbourhood searched by the denoiser (odd).
    pub denoise_search_window: u32,

    /// Side of the Gaussian neighbourhood used for thresholding (odd).
    pub threshold_block_size: u32,

    /// Constant subtracted from the local mean before thresholding.
    pub threshold_offset: i32,

    /// Side of the square structuring element for the closing step.
    pub closing_kernel_size: u32,

    /// Apply histogram equalization as the last step.
    pub equalize_histogram: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            deskew: true,
            min_skew_degrees: 0.5,
            denoise_strength: 10.0,
            denoise_template_window: 7,
            denoise_search_window: 21,
            threshold_block_size: 11,
            threshold_offset: 2,
            closing_kernel_size: 1,
            equalize_histogram: true,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum advisory entries kept.
    pub max_advisories: usize,

    /// Keyword-scanned lines must be longer than this (characters).
    pub min_advisory_line_len: usize,

    /// Keyword-scanned lines must be shorter than this (characters).
    pub max_advisory_line_len: usize,

    /// Additional patterns per field key, tried after the built-in ones.
    pub extra_patterns: HashMap<String, Vec<String>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_advisories: 10,
            min_advisory_line_len: 15,
            max_advisory_line_len: 200,
            extra_patterns: HashMap::new(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
