//! Image conditioning and text recognition.

mod denoise;
mod deskew;
mod preprocessing;
mod recognizer;

pub use denoise::NonLocalMeans;
pub use deskew::{estimate_skew, rotate_about_center};
pub use preprocessing::ImagePreprocessor;
pub use recognizer::{TesseractRecognizer, TextRecognizer};

use image::GrayImage;

/// A single-channel binary page, ready for recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionedImage(GrayImage);

impl ConditionedImage {
    pub fn new(image: GrayImage) -> Self {
        Self(image)
    }

    pub fn image(&self) -> &GrayImage {
        &self.0
    }

    /// Width and height in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn into_inner(self) -> GrayImage {
        self.0
    }
}
