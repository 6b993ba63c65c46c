//! Scan a single report (image, PDF or recognized text) and emit the result JSON.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info, warn};

use soilscan_core::{ExtractionResult, ReportScanner, ScanConfig, ScanError, is_pdf};

use crate::Cli;

const USAGE: &str = "Usage: soilscan <image_path>";

pub fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let start = Instant::now();

    let Some(input) = cli.image.as_deref() else {
        return usage(cli);
    };

    let scanner = match load_config(cli).and_then(|config| ReportScanner::from_config(&config)) {
        Ok(scanner) => scanner,
        Err(err) => {
            warn!(error = %err, "Invalid configuration");
            emit(cli, &ExtractionResult::failed(err.to_string()))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let result = if cli.text {
        scan_text_file(&scanner, input)
    } else if is_pdf(input) {
        scanner.scan_pdf(input)
    } else {
        scanner.scan(input)
    };

    emit(cli, &result)?;
    debug!("Total processing time: {:?}", start.elapsed());

    // A result object was produced, even when it carries an error.
    Ok(ExitCode::SUCCESS)
}

/// Emit the usage result and fail.
pub fn usage(cli: &Cli) -> anyhow::Result<ExitCode> {
    emit(cli, &ExtractionResult::failed(USAGE))?;
    Ok(ExitCode::FAILURE)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("soilscan").join("config.json"))
}

fn load_config(cli: &Cli) -> Result<ScanConfig, ScanError> {
    let path = cli
        .config
        .clone()
        .or_else(|| default_config_path().filter(|path| path.exists()));

    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ScanConfig::from_file(&path)
                .map_err(|e| ScanError::Config(format!("{}: {e}", path.display())))?
        }
        None => ScanConfig::default(),
    };

    if let Some(tesseract) = &cli.tesseract {
        config.ocr.tesseract_path = tesseract.clone();
    }
    if let Some(secs) = cli.timeout {
        config.ocr.timeout_secs = secs;
    }

    Ok(config)
}

fn scan_text_file(scanner: &ReportScanner, path: &Path) -> ExtractionResult {
    if !path.exists() {
        return ExtractionResult::failed(ScanError::FileNotFound(path.to_path_buf()).to_string());
    }

    match fs::read_to_string(path) {
        Ok(text) => scanner.scan_text(&text),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to read text input");
            ExtractionResult::failed(ScanError::Unexpected(err.to_string()).to_string())
        }
    }
}

fn render(result: &ExtractionResult, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(result)
    } else {
        serde_json::to_string_pretty(result)
    }
}

fn emit(cli: &Cli, result: &ExtractionResult) -> anyhow::Result<()> {
    let json = render(result, cli.compact)?;

    match &cli.output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    Ok(())
}
