//! Text recognition backends.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::ConditionedImage;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Recognizes text in a conditioned page image.
pub trait TextRecognizer: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Recognize all text on the page, trimmed.
    fn recognize(&self, image: &ConditionedImage) -> Result<String, OcrError>;
}

/// Runs the Tesseract command-line engine on a scratch copy of the image.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
    engine_mode: u8,
    page_segmentation_mode: u8,
    language: String,
    tessdata_dir: Option<PathBuf>,
    timeout: Duration,
    poll_interval: Duration,
}

impl TesseractRecognizer {
    /// Create a recognizer for the given executable with default settings.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::from_config(&OcrConfig {
            tesseract_path: program.into(),
            ..Default::default()
        })
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            program: config.tesseract_path.clone(),
            engine_mode: config.engine_mode,
            page_segmentation_mode: config.page_segmentation_mode,
            language: config.language.clone(),
            tessdata_dir: config.tessdata_dir.clone(),
            timeout: config.timeout(),
            poll_interval: Duration::from_millis(25),
        }
    }

    /// Set the upper bound on a single recognition call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, input: &Path, out_base: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(input)
            .arg(out_base)
            .arg("--oem")
            .arg(self.engine_mode.to_string())
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .arg("-l")
            .arg(&self.language);
        if let Some(dir) = &self.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }
        command
    }

    /// Wait for `child`, killing it once the timeout has elapsed.
    fn wait_with_timeout(&self, child: &mut Child) -> Result<ExitStatus, OcrError> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Recognizer finished");
                return Ok(status);
            }
            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(OcrError::Timeout(self.timeout));
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &ConditionedImage) -> Result<String, OcrError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("page.png");
        let out_base = dir.path().join("out");
        let stderr_path = dir.path().join("stderr.log");

        image.image().save(&input)?;
        let (width, height) = image.dimensions();
        info!(
            program = %self.program.display(),
            width,
            height,
            "Running recognizer"
        );

        let mut command = self.command(&input, &out_base);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(File::create(&stderr_path)?));

        let mut child = command.spawn().map_err(|source| OcrError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let status = self.wait_with_timeout(&mut child)?;
        if !status.success() {
            let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(OcrError::Exit {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let text = fs::read_to_string(out_base.with_extension("txt"))?;
        let text = text.trim();
        debug!(chars = text.len(), "Recognized text");
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn blank_page() -> ConditionedImage {
        ConditionedImage::new(GrayImage::from_pixel(8, 8, Luma([255])))
    }

    #[test]
    fn test_command_line() {
        let recognizer = TesseractRecognizer::from_config(&OcrConfig {
            tessdata_dir: Some(PathBuf::from("/opt/tessdata")),
            ..Default::default()
        });
        let command = recognizer.command(Path::new("in.png"), Path::new("out"));

        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "in.png", "out", "--oem", "3", "--psm", "6", "-l", "eng",
                "--tessdata-dir", "/opt/tessdata"
            ]
        );
        assert_eq!(command.get_program(), "tesseract");
    }

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let recognizer = TesseractRecognizer::new("/nonexistent/soilscan-tesseract");
        let err = recognizer.recognize(&blank_page()).unwrap_err();
        assert!(matches!(err, OcrError::Spawn { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    mod script {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable shell script standing in for tesseract.
        fn fake_engine(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-tesseract");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_reads_output_file() {
            let dir = tempfile::tempdir().unwrap();
            let program = fake_engine(dir.path(), r#"printf 'pH: 6.5\nZinc: 1.2\n' > "$2.txt""#);

            let text = TesseractRecognizer::new(program)
                .recognize(&blank_page())
                .unwrap();
            assert_eq!(text, "pH: 6.5\nZinc: 1.2");
        }

        #[test]
        fn test_nonzero_exit_carries_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let program = fake_engine(dir.path(), "echo 'no language data' >&2\nexit 3");

            let err = TesseractRecognizer::new(program)
                .recognize(&blank_page())
                .unwrap_err();
            match err {
                OcrError::Exit { stderr, .. } => assert_eq!(stderr, "no language data"),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_slow_engine_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let program = fake_engine(dir.path(), "exec sleep 5");

            let start = Instant::now();
            let err = TesseractRecognizer::new(program)
                .with_timeout(Duration::from_millis(200))
                .recognize(&blank_page())
                .unwrap_err();

            assert!(matches!(err, OcrError::Timeout(_)), "got {err:?}");
            assert!(start.elapsed() < Duration::from_secs(4));
        }
    }
}
