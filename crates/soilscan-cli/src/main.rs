//! CLI application for soil-test report OCR.

mod scan;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Soil report OCR - extract soil health card values as JSON
#[derive(Parser, Debug, Default)]
#[command(name = "soilscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (logs go to stderr)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report image or PDF to scan
    image: Option<PathBuf>,

    /// Treat the input as already recognized text
    #[arg(long)]
    text: bool,

    /// Tesseract executable
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// Recognition timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            // Downstream consumers still get a result object on stdout.
            eprint!("{err}");
            return finish(scan::usage(&Cli::default()));
        }
    };

    init_logging(cli.verbose);
    finish(scan::run(&cli))
}

fn finish(outcome: anyhow::Result<ExitCode>) -> ExitCode {
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    // stdout carries only the JSON result.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
