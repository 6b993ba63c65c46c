use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const SAMPLE: &str = "SOIL ANALYSIS REPORT
pH Level: 6.5
Nitrogen (N): 45 mg/kg
Phosphorus (P): 25 mg/kg
Potassium (K): 180 mg/kg
Organic Carbon: 0.8%
Available Sulfur: 15 mg/kg
Zinc: 1.2 mg/kg
Iron: 8.5 mg/kg
Manganese: 3.4 mg/kg
Copper: 0.9 mg/kg
Boron: 0.6 mg/kg";

/// `soilscan` with the user config directory pointed at `home`.
fn soilscan(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("soilscan").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is a single JSON object")
}

fn write_page(dir: &Path) -> PathBuf {
    let mut page = GrayImage::from_pixel(48, 32, Luma([235]));
    for x in 6..40 {
        page.put_pixel(x, 12, Luma([10]));
    }
    let path = dir.join("card.png");
    page.save(&path).unwrap();
    path
}

#[test]
fn test_missing_argument_prints_usage_result() {
    let home = TempDir::new().unwrap();
    let output = soilscan(home.path()).assert().failure().code(1).get_output().clone();

    let json = stdout_json(&output.stdout);
    assert_eq!(json["error"], "Usage: soilscan <image_path>");
    assert_eq!(json["confidence_score"], 0.0);
    assert!(json["soil_metrics"]["ph"].is_null());
}

#[test]
fn test_missing_file_is_fail_soft() {
    let home = TempDir::new().unwrap();
    let output = soilscan(home.path())
        .arg("/nonexistent/card.png")
        .assert()
        .success()
        .get_output()
        .clone();

    let json = stdout_json(&output.stdout);
    assert_eq!(json["error"], "File not found: /nonexistent/card.png");
    assert_eq!(json["advisory"], serde_json::json!([]));
    assert_eq!(json["raw_text"], "");
}

#[test]
fn test_text_mode_extracts_sample() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("card.txt");
    fs::write(&input, SAMPLE).unwrap();

    let output = soilscan(home.path())
        .args(["--text", "-vv"])
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .clone();

    let json = stdout_json(&output.stdout);
    assert!(json["error"].is_null());
    assert_eq!(json["soil_metrics"]["nitrogen_kg_ha"], 45.0);
    assert_eq!(json["soil_metrics"]["ph"], 6.5);
    assert_eq!(json["micronutrients"]["boron"], 0.6);
    assert_eq!(json["confidence_score"], 0.68);
}

#[test]
fn test_compact_output() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("card.txt");
    fs::write(&input, "pH: 7.1").unwrap();

    soilscan(home.path())
        .args(["--text", "--compact"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\"farmer_details\":"))
        .stdout(predicate::str::contains("\"ph\":7.1"))
        .stdout(predicate::str::ends_with("}\n"));
}

#[test]
fn test_output_file() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("card.txt");
    let target = home.path().join("result.json");
    fs::write(&input, SAMPLE).unwrap();

    soilscan(home.path())
        .arg("--text")
        .arg(&input)
        .arg("-o")
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let json: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(json["micronutrients"]["zinc"], 1.2);
}

#[test]
fn test_unreadable_image() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("card.png");
    fs::write(&input, b"not a png").unwrap();

    let output = soilscan(home.path()).arg(&input).assert().success().get_output().clone();
    assert_eq!(stdout_json(&output.stdout)["error"], "Failed to read image");
}

#[test]
fn test_pdf_input_is_routed_by_extension() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("card.pdf");
    fs::write(&input, b"%PDF-1.4 broken").unwrap();

    // Picked by extension: a broken PDF is reported as such, not as an image.
    let output = soilscan(home.path()).arg(&input).assert().success().get_output().clone();
    let json = stdout_json(&output.stdout);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Failed to read PDF: "), "{error}");
}

#[test]
fn test_invalid_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.json");
    fs::write(&config, r#"{"extraction": {"extra_patterns": {"soil_type": ["(\\w+)"]}}}"#).unwrap();

    let output = soilscan(home.path())
        .arg("-c")
        .arg(&config)
        .arg("card.png")
        .assert()
        .failure()
        .code(1)
        .get_output()
        .clone();

    let json = stdout_json(&output.stdout);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Configuration error: "), "{error}");
}

#[test]
fn test_default_config_location_is_used() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".config").join("soilscan");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.json"),
        r#"{"extraction": {"extra_patterns": {"ph": ["(?i)acidity\\s+index\\s+(\\d[\\d.]*)"]}}}"#,
    )
    .unwrap();

    let input = home.path().join("card.txt");
    fs::write(&input, "Acidity index 5.4").unwrap();

    let output = soilscan(home.path())
        .arg("--text")
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output.stdout)["soil_metrics"]["ph"], 5.4);
}

#[test]
fn test_unknown_flag_still_emits_json() {
    let home = TempDir::new().unwrap();
    let output = soilscan(home.path())
        .arg("--frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--frobnicate"))
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output.stdout)["error"], "Usage: soilscan <image_path>");
}

#[cfg(unix)]
mod with_fake_tesseract {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_tesseract(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("tesseract");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_image_scan_end_to_end() {
        let home = TempDir::new().unwrap();
        let text = home.path().join("recognized.txt");
        fs::write(&text, SAMPLE).unwrap();
        let tesseract = fake_tesseract(home.path(), &format!("cp '{}' \"$2.txt\"", text.display()));
        let image = write_page(home.path());

        let output = soilscan(home.path())
            .arg("--tesseract")
            .arg(&tesseract)
            .arg(&image)
            .assert()
            .success()
            .get_output()
            .clone();

        let json = stdout_json(&output.stdout);
        assert!(json["error"].is_null());
        assert_eq!(json["raw_text"], SAMPLE);
        assert_eq!(json["micronutrients"]["manganese"], 3.4);
    }

    #[test]
    fn test_empty_recognition() {
        let home = TempDir::new().unwrap();
        let tesseract = fake_tesseract(home.path(), ": > \"$2.txt\"");
        let image = write_page(home.path());

        let output = soilscan(home.path())
            .arg("--tesseract")
            .arg(&tesseract)
            .arg(&image)
            .assert()
            .success()
            .get_output()
            .clone();

        assert_eq!(
            stdout_json(&output.stdout)["error"],
            "No text extracted from image"
        );
    }

    #[test]
    fn test_recognizer_crash_is_empty_text() {
        let home = TempDir::new().unwrap();
        let tesseract = fake_tesseract(home.path(), "echo 'Error opening data file' >&2\nexit 1");
        let image = write_page(home.path());

        let output = soilscan(home.path())
            .arg("--tesseract")
            .arg(&tesseract)
            .arg(&image)
            .assert()
            .success()
            .stderr(predicate::str::contains("Recognition failed"))
            .get_output()
            .clone();

        assert_eq!(
            stdout_json(&output.stdout)["error"],
            "No text extracted from image"
        );
    }
}
