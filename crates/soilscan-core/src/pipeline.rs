//! Scan orchestration: image or PDF report to scored extraction result.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::error::{ScanError, panic_message};
use crate::models::config::ScanConfig;
use crate::models::report::ExtractionResult;
use crate::ocr::{ImagePreprocessor, TesseractRecognizer, TextRecognizer};
use crate::pdf::PdfTextExtractor;
use crate::report::{SoilReportParser, normalize};

/// States a scan moves through. Any state can end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    FileChecked,
    Preprocessed,
    Recognized,
    Normalized,
    Extracted,
    Scored,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "start",
            PipelineStage::FileChecked => "file_checked",
            PipelineStage::Preprocessed => "preprocessed",
            PipelineStage::Recognized => "recognized",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Extracted => "extracted",
            PipelineStage::Scored => "scored",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Logs stage transitions with the time spent in each stage.
struct StageTracker {
    stage: PipelineStage,
    started: Instant,
    entered: Instant,
}

impl StageTracker {
    fn start() -> Self {
        let now = Instant::now();
        Self {
            stage: PipelineStage::Start,
            started: now,
            entered: now,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug!(
            from = %self.stage,
            to = %next,
            stage_ms = self.entered.elapsed().as_millis() as u64,
            "Pipeline transition"
        );
        self.stage = next;
        self.entered = Instant::now();
    }

    fn fail(&mut self, reason: &str) {
        warn!(stage = %self.stage, reason, "Pipeline failed");
        self.stage = PipelineStage::Failed;
    }

    fn total_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// End-to-end soil report scanner.
///
/// Never fails outright: every problem ends up in the `error` field of an
/// otherwise fully shaped [`ExtractionResult`].
pub struct ReportScanner {
    preprocessor: ImagePreprocessor,
    recognizer: Box<dyn TextRecognizer>,
    parser: SoilReportParser,
}

impl ReportScanner {
    /// Scanner with default settings and the `tesseract` on `PATH`.
    pub fn new() -> Self {
        Self {
            preprocessor: ImagePreprocessor::new(),
            recognizer: Box::new(TesseractRecognizer::new("tesseract")),
            parser: SoilReportParser::new(),
        }
    }

    /// Build a scanner from configuration.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        Ok(Self {
            preprocessor: ImagePreprocessor::with_config(config.preprocessing.clone()),
            recognizer: Box::new(TesseractRecognizer::from_config(&config.ocr)),
            parser: SoilReportParser::from_config(&config.extraction)?,
        })
    }

    /// Replace the recognition backend.
    pub fn with_recognizer(mut self, recognizer: impl TextRecognizer + 'static) -> Self {
        self.recognizer = Box::new(recognizer);
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_parser(mut self, parser: SoilReportParser) -> Self {
        self.parser = parser;
        self
    }

    /// Scan the report image at `path`.
    pub fn scan(&self, path: &Path) -> ExtractionResult {
        info!(path = %path.display(), recognizer = self.recognizer.name(), "Scanning report");
        let mut result = ExtractionResult::default();
        let mut tracker = StageTracker::start();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_image(path, &mut result, &mut tracker)
        }));
        finish(result, &mut tracker, outcome)
    }

    /// Scan a PDF report through its embedded text layer. Conditioning and
    /// recognition are skipped.
    pub fn scan_pdf(&self, path: &Path) -> ExtractionResult {
        info!(path = %path.display(), "Scanning PDF report");
        let mut result = ExtractionResult::default();
        let mut tracker = StageTracker::start();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_pdf(path, &mut result, &mut tracker)
        }));
        finish(result, &mut tracker, outcome)
    }

    /// Run the pipeline from recognition onward on already recognized text.
    pub fn scan_text(&self, raw: &str) -> ExtractionResult {
        info!(chars = raw.len(), "Scanning recognized text");
        let mut result = ExtractionResult::default();
        let mut tracker = StageTracker::start();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_text(raw, &mut result, &mut tracker)
        }));
        finish(result, &mut tracker, outcome)
    }

    fn run_image(
        &self,
        path: &Path,
        result: &mut ExtractionResult,
        tracker: &mut StageTracker,
    ) -> Result<(), ScanError> {
        if !path.exists() {
            return Err(ScanError::FileNotFound(path.to_path_buf()));
        }
        tracker.advance(PipelineStage::FileChecked);

        let conditioned = self.preprocessor.preprocess(path)?;
        tracker.advance(PipelineStage::Preprocessed);

        let raw = match self.recognizer.recognize(&conditioned) {
            Ok(text) => text,
            Err(err) => {
                warn!(recognizer = self.recognizer.name(), error = %err, "Recognition failed");
                String::new()
            }
        };

        self.run_text(&raw, result, tracker)
    }

    fn run_pdf(
        &self,
        path: &Path,
        result: &mut ExtractionResult,
        tracker: &mut StageTracker,
    ) -> Result<(), ScanError> {
        if !path.exists() {
            return Err(ScanError::FileNotFound(path.to_path_buf()));
        }
        tracker.advance(PipelineStage::FileChecked);

        let extractor = PdfTextExtractor::open(path)?;
        let text = extractor.text()?;
        if text.trim().is_empty() {
            warn!(pages = extractor.page_count(), "PDF has no text layer");
        }

        self.run_text(&text, result, tracker)
    }

    fn run_text(
        &self,
        raw: &str,
        result: &mut ExtractionResult,
        tracker: &mut StageTracker,
    ) -> Result<(), ScanError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ScanError::NoTextRecognized);
        }
        result.raw_text = raw.to_string();
        tracker.advance(PipelineStage::Recognized);

        let text = normalize(raw);
        tracker.advance(PipelineStage::Normalized);

        let failures = self.parser.extract_into(&text, result);
        tracker.advance(PipelineStage::Extracted);

        result.confidence_score = self.parser.score(result);
        tracker.advance(PipelineStage::Scored);

        if let Some(first) = failures.into_iter().next() {
            return Err(ScanError::Unexpected(first));
        }
        tracker.advance(PipelineStage::Done);
        Ok(())
    }
}

impl Default for ReportScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn finish(
    mut result: ExtractionResult,
    tracker: &mut StageTracker,
    outcome: std::thread::Result<Result<(), ScanError>>,
) -> ExtractionResult {
    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(error = %message, "Pipeline panicked");
            Some(ScanError::Unexpected(message))
        }
    };

    if let Some(err) = failure {
        let reason = err.to_string();
        tracker.fail(&reason);
        result.error = Some(reason);
    }

    info!(
        total_ms = tracker.total_ms(),
        confidence = result.confidence_score,
        success = result.is_success(),
        "Scan finished"
    );
    result
}
