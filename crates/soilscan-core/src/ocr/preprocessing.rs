//! Image conditioning for OCR.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use super::ConditionedImage;
use super::denoise::NonLocalMeans;
use super::deskew::{estimate_skew, rotate_about_center};
use crate::error::PreprocessError;
use crate::models::config::PreprocessConfig;

/// Turns a photographed or scanned page into a clean binary image.
///
/// Steps, in order: grayscale, deskew, non-local-means denoise, adaptive
/// Gaussian threshold, morphological closing, histogram equalization.
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::with_config(PreprocessConfig::default())
    }

    /// Create a preprocessor with explicit settings.
    pub fn with_config(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Load the image at `path` and condition it.
    pub fn preprocess(&self, path: &Path) -> Result<ConditionedImage, PreprocessError> {
        let image = image::open(path).map_err(PreprocessError::Read)?;
        self.condition(&image)
    }

    /// Condition an already decoded image.
    pub fn condition(&self, image: &DynamicImage) -> Result<ConditionedImage, PreprocessError> {
        self.validate()?;

        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(PreprocessError::Processing("empty image".to_string()));
        }
        debug!(width, height, "Conditioning image");

        let gray = if self.config.deskew {
            self.deskew(gray)
        } else {
            gray
        };

        let denoised = NonLocalMeans {
            strength: self.config.denoise_strength,
            template_window: self.config.denoise_template_window,
            search_window: self.config.denoise_search_window,
        }
        .apply(&gray);

        let binary = adaptive_threshold(
            &denoised,
            self.config.threshold_block_size,
            self.config.threshold_offset,
        );
        let closed = close(&binary, self.config.closing_kernel_size);

        let conditioned = if self.config.equalize_histogram {
            equalize_histogram(&closed)
        } else {
            closed
        };

        Ok(ConditionedImage::new(conditioned))
    }

    fn validate(&self) -> Result<(), PreprocessError> {
        let block = self.config.threshold_block_size;
        if block < 3 || block % 2 == 0 {
            return Err(PreprocessError::Processing(format!(
                "threshold block size must be odd and greater than 1, got {block}"
            )));
        }

        for (name, size) in [
            ("denoise template window", self.config.denoise_template_window),
            ("denoise search window", self.config.denoise_search_window),
        ] {
            if size % 2 == 0 {
                return Err(PreprocessError::Processing(format!(
                    "{name} must be odd, got {size}"
                )));
            }
        }

        if self.config.closing_kernel_size == 0 {
            return Err(PreprocessError::Processing(
                "closing kernel size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Best effort: an image without a usable estimate is returned as is.
    fn deskew(&self, gray: GrayImage) -> GrayImage {
        match estimate_skew(&gray) {
            Some(angle) if angle.abs() > self.config.min_skew_degrees => {
                debug!(angle, "Correcting skew");
                rotate_about_center(&gray, -angle)
            }
            Some(angle) => {
                debug!(angle, "Skew below threshold, not rotating");
                gray
            }
            None => {
                debug!("No foreground pixels, skipping deskew");
                gray
            }
        }
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Gaussian kernel of odd `size`, normalized to sum to one.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as i32;
    let denom = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Binarize against a Gaussian-weighted local mean: a pixel becomes white
/// when it is brighter than `mean - c`.
fn adaptive_threshold(image: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let kernel = gaussian_kernel(block_size);
    let radius = (block_size / 2) as isize;
    let raw = image.as_raw();

    let clamp = |i: isize, len: usize| i.clamp(0, len as isize - 1) as usize;

    // Horizontal pass.
    let mut horizontal = vec![0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp(x as isize + k as isize - radius, w);
                acc += weight * raw[y * w + sx] as f32;
            }
            horizontal[y * w + x] = acc;
        }
    }

    // Vertical pass and comparison.
    let mut result = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp(y as isize + k as isize - radius, h);
                acc += weight * horizontal[sy * w + x];
            }

            let mean = acc.round().clamp(0.0, 255.0) as i32;
            let pixel = raw[y * w + x] as i32;
            let output = if pixel > mean - c { 255 } else { 0 };
            result.put_pixel(x as u32, y as u32, Luma([output]));
        }
    }

    result
}

/// Morphological closing (dilate then erode) with a `size` x `size` square.
fn close(image: &GrayImage, size: u32) -> GrayImage {
    if size <= 1 {
        return image.clone();
    }
    let dilated = morph(image, size, u8::max);
    morph(&dilated, size, u8::min)
}

fn morph(image: &GrayImage, size: u32, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let before = (size / 2) as i64;
    let after = (size - 1) as i64 - before;

    let mut result = GrayImage::new(width, height);
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut value = image.get_pixel(x as u32, y as u32)[0];
            // Out-of-bounds neighbours are ignored.
            for ny in (y - before).max(0)..=(y + after).min(height as i64 - 1) {
                for nx in (x - before).max(0)..=(x + after).min(width as i64 - 1) {
                    value = pick(value, image.get_pixel(nx as u32, ny as u32)[0]);
                }
            }
            result.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
    result
}

/// Spread the intensity histogram over the full 0..=255 range.
fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total = image.width() as u64 * image.height() as u64;
    let Some(first) = histogram.iter().position(|&count| count > 0) else {
        return image.clone();
    };
    let first_count = histogram[first];
    if first_count == total {
        return image.clone();
    }

    let scale = 255.0 / (total - first_count) as f64;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u64;
    for (value, &count) in histogram.iter().enumerate().skip(first + 1) {
        cumulative += count;
        lut[value] = (cumulative as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }

    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }
    result
}
