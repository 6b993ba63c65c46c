//! Skew estimation and correction.
//!
//! The skew angle is taken from the minimum-area rectangle that encloses every
//! foreground (non-zero) pixel. Only the leftmost and rightmost foreground
//! pixel of each row can lie on the convex hull, so those are the only points
//! fed to the hull.

use image::{GrayImage, Luma};

type Point = (i64, i64);

/// Estimate the skew of `image` in degrees, folded into `(-45, 45]`.
///
/// Returns `None` when the image has no foreground pixels.
pub fn estimate_skew(image: &GrayImage) -> Option<f64> {
    let points = foreground_extremes(image);
    if points.is_empty() {
        return None;
    }

    let hull = convex_hull(points);
    Some(fold_angle(min_area_rect_angle(&hull)))
}

/// Rotate `image` about its center by `degrees` (positive is clockwise on
/// screen), using bicubic interpolation and edge replication at the borders.
pub fn rotate_about_center(image: &GrayImage, degrees: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    let cx = (width / 2) as f64;
    let cy = (height / 2) as f64;
    let (sin, cos) = degrees.to_radians().sin_cos();

    let mut rotated = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            // Inverse mapping: where in the source does this output pixel come from.
            let sx = cos * dx + sin * dy + cx;
            let sy = -sin * dx + cos * dy + cy;
            rotated.put_pixel(x, y, Luma([sample_bicubic(image, sx, sy)]));
        }
    }

    rotated
}

/// Fold an angle into `(-45, 45]` by steps of 90 degrees.
pub fn fold_angle(mut angle: f64) -> f64 {
    while angle > 45.0 {
        angle -= 90.0;
    }
    while angle <= -45.0 {
        angle += 90.0;
    }
    angle
}

fn foreground_extremes(image: &GrayImage) -> Vec<Point> {
    let (width, height) = image.dimensions();
    let raw = image.as_raw();
    let width = width as usize;
    let mut points = Vec::with_capacity(height as usize * 2);

    if width == 0 {
        return points;
    }

    for (y, row) in raw.chunks_exact(width).enumerate() {
        let Some(first) = row.iter().position(|&p| p > 0) else {
            continue;
        };
        // A foreground pixel exists, so rposition always finds one.
        let last = row.iter().rposition(|&p| p > 0).unwrap_or(first);

        points.push((first as i64, y as i64));
        if last != first {
            points.push((last as i64, y as i64));
        }
    }

    points
}

fn cross(o: Point, a: Point, b: Point) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Andrew's monotone chain.
fn convex_hull(mut points: Vec<Point>) -> Vec<Point> {
    points.sort_unstable();
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(points.len());
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Angle (degrees) of the hull edge that supports the minimum-area
/// enclosing rectangle (rotating calipers).
fn min_area_rect_angle(hull: &[Point]) -> f64 {
    match hull.len() {
        0 | 1 => return 0.0,
        2 => {
            let dx = (hull[1].0 - hull[0].0) as f64;
            let dy = (hull[1].1 - hull[0].1) as f64;
            return dy.atan2(dx).to_degrees();
        }
        _ => {}
    }

    let mut best_area = f64::INFINITY;
    let mut best_angle = 0.0;

    for (i, &a) in hull.iter().enumerate() {
        let b = hull[(i + 1) % hull.len()];
        let dx = (b.0 - a.0) as f64;
        let dy = (b.1 - a.1) as f64;
        let len = dx.hypot(dy);
        if len == 0.0 {
            continue;
        }
        let (ux, uy) = (dx / len, dy / len);

        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in hull {
            let px = (p.0 - a.0) as f64;
            let py = (p.1 - a.1) as f64;
            let u = px * ux + py * uy;
            let v = py * ux - px * uy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if area < best_area - 1e-9 {
            best_area = area;
            best_angle = dy.atan2(dx).to_degrees();
        }
    }

    best_angle
}

/// Cubic convolution kernel with a = -0.75.
fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.75;
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

fn sample_bicubic(image: &GrayImage, x: f64, y: f64) -> u8 {
    let (width, height) = image.dimensions();
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = 0.0;
    for j in -1..=2i64 {
        let wy = cubic_weight(fy - j as f64);
        let sy = (y0 + j).clamp(0, max_y) as u32;
        for i in -1..=2i64 {
            let wx = cubic_weight(fx - i as f64);
            let sx = (x0 + i).clamp(0, max_x) as u32;
            acc += wx * wy * image.get_pixel(sx, sy)[0] as f64;
        }
    }

    acc.round().clamp(0.0, 255.0) as u8
}
