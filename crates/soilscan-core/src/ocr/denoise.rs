//! Non-local-means denoising for grayscale images.
//!
//! For every offset in the search window the squared difference between the
//! image and its shifted copy is summed over the template window with an
//! integral image, so the cost is O(pixels x search area) regardless of the
//! template size.

use image::GrayImage;

/// Weights below this are treated as zero.
const MIN_WEIGHT: f32 = 1e-4;

/// Non-local-means filter parameters.
#[derive(Debug, Clone, Copy)]
pub struct NonLocalMeans {
    /// Filter strength. Larger values smooth more.
    pub strength: f32,
    /// Side of the compared patch (odd).
    pub template_window: u32,
    /// Side of the searched neighbourhood (odd).
    pub search_window: u32,
}

impl Default for NonLocalMeans {
    fn default() -> Self {
        Self {
            strength: 10.0,
            template_window: 7,
            search_window: 21,
        }
    }
}

impl NonLocalMeans {
    /// Denoise `image`. Borders are handled by edge replication.
    pub fn apply(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || self.strength <= 0.0 {
            return image.clone();
        }

        let src: Vec<f32> = image.as_raw().iter().map(|&p| p as f32).collect();
        let template_radius = (self.template_window / 2) as usize;
        let search_radius = (self.search_window / 2) as isize;
        let weights = self.weight_table();

        let n = w * h;
        let mut weight_sum = vec![0f32; n];
        let mut value_sum = vec![0f32; n];
        let mut diff = vec![0f32; n];
        let mut integral = vec![0f64; (w + 1) * (h + 1)];

        for dy in -search_radius..=search_radius {
            for dx in -search_radius..=search_radius {
                for y in 0..h {
                    let sy = shift(y, dy, h);
                    for x in 0..w {
                        let sx = shift(x, dx, w);
                        let d = src[y * w + x] - src[sy * w + sx];
                        diff[y * w + x] = d * d;
                    }
                }

                build_integral(&diff, w, h, &mut integral);

                for y in 0..h {
                    let y0 = y.saturating_sub(template_radius);
                    let y1 = (y + template_radius + 1).min(h);
                    let sy = shift(y, dy, h);
                    for x in 0..w {
                        let x0 = x.saturating_sub(template_radius);
                        let x1 = (x + template_radius + 1).min(w);

                        let stride = w + 1;
                        let sum = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                            - integral[y1 * stride + x0]
                            + integral[y0 * stride + x0];
                        let count = ((y1 - y0) * (x1 - x0)) as f64;
                        let distance = (sum / count).round() as usize;

                        let weight = weights.get(distance).copied().unwrap_or(0.0);
                        if weight > 0.0 {
                            let sx = shift(x, dx, w);
                            weight_sum[y * w + x] += weight;
                            value_sum[y * w + x] += weight * src[sy * w + sx];
                        }
                    }
                }
            }
        }

        let pixels = value_sum
            .iter()
            .zip(&weight_sum)
            .map(|(&v, &wt)| (v / wt).round().clamp(0.0, 255.0) as u8)
            .collect();

        // Same dimensions as the source, so the buffer always fits.
        GrayImage::from_raw(width, height, pixels).unwrap_or_else(|| image.clone())
    }

    /// Weight for each integer mean squared patch distance, truncated where
    /// the weight becomes negligible.
    fn weight_table(&self) -> Vec<f32> {
        let h2 = self.strength * self.strength;
        let max_distance = (h2 * (1.0 / MIN_WEIGHT).ln()).ceil() as usize;
        (0..=max_distance)
            .map(|d| (-(d as f32) / h2).exp())
            .collect()
    }
}

fn shift(index: usize, offset: isize, len: usize) -> usize {
    (index as isize + offset).clamp(0, len as isize - 1) as usize
}

fn build_integral(values: &[f32], w: usize, h: usize, integral: &mut [f64]) {
    let stride = w + 1;
    for y in 0..h {
        let mut row_sum = 0f64;
        for x in 0..w {
            row_sum += values[y * w + x] as f64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
}
