//! Error types for the soilscan-core library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Terminal failure of a scan. Rendered into the `error` field of the result.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Input path does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Image could not be loaded or conditioned.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// PDF report could not be read.
    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// Recognition produced no text.
    #[error("No text extracted from image")]
    NoTextRecognized,

    /// Anything not anticipated by the stage contracts.
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// Invalid configuration or user-supplied pattern.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while conditioning an image for recognition.
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// The file is missing, unreadable, or not a decodable image.
    #[error("Failed to read image")]
    Read(#[source] image::ImageError),

    /// A conditioning step failed.
    #[error("Preprocessing error: {0}")]
    Processing(String),
}

/// Errors raised while reading the text layer of a PDF report.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The file could not be read.
    #[error("Failed to read PDF: {0}")]
    Read(#[source] std::io::Error),

    /// The document structure could not be parsed.
    #[error("Failed to read PDF: {0}")]
    Parse(String),

    /// Encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    #[error("PDF has no pages")]
    NoPages,

    #[error("Failed to extract PDF text: {0}")]
    TextExtraction(String),
}

/// Errors raised by a recognition backend.
///
/// These never reach the result record; the orchestrator logs them and
/// continues with empty text.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR executable could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Scratch file handling failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The conditioned image could not be encoded for the backend.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Recognition did not finish in time.
    #[error("recognition timed out after {0:?}")]
    Timeout(Duration),

    /// The backend exited unsuccessfully.
    #[error("recognizer exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
}

/// Result type for the soilscan library.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
