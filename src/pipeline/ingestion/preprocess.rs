//! Raster cleanup ahead of OCR.
//!
//! Fixed pipeline: grayscale, global Otsu binarization, 3x3 median denoise,
//! then deskew. Everything here is pure Rust over `image::GrayImage`; no
//! OpenCV binding is involved.
//!
//! Deskew detects straight edges with a Sobel operator, votes them into a
//! Hough accumulator restricted to near-horizontal directions, and takes the
//! median direction of the strongest lines. Medians beyond
//! [`MAX_SKEW_DEGREES`] are treated as spurious, and corrections under
//! [`MIN_ROTATION_DEGREES`] are skipped as noise.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use tracing::debug;

use super::types::ImagePreprocessor;
use super::ExtractionError;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Maximum input image size (in bytes) before rejecting.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

/// Smallest plausible encoded image (a 1x1 PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// A median skew beyond this is assumed to come from stray lines, not the page.
pub const MAX_SKEW_DEGREES: f32 = 10.0;

/// Rotations at or below this magnitude are not worth the resampling.
pub const MIN_ROTATION_DEGREES: f32 = 0.5;

/// Hough search window around horizontal, in degrees.
const HOUGH_ANGLE_RANGE: f32 = 45.0;
const HOUGH_ANGLE_STEP: f32 = 0.25;
const HOUGH_RHO_STEP: f32 = 1.0;

/// Strongest accumulator peaks that take part in the median.
const HOUGH_MAX_LINES: usize = 64;

/// Edge points beyond this are sampled with a stride.
const HOUGH_MAX_POINTS: usize = 60_000;

const MIN_LINE_VOTES: u32 = 10;
const MAX_LINE_VOTES: u32 = 100;

/// Sobel magnitude (|gx| + |gy|) above which a pixel counts as an edge.
const EDGE_MAGNITUDE: i32 = 255;

// ═══════════════════════════════════════════════════════════
// Pipeline
// ═══════════════════════════════════════════════════════════

/// Grayscale → Otsu → median → deskew. Output is a PNG.
#[derive(Debug, Clone, Default)]
pub struct OcrPreprocessor;

impl ImagePreprocessor for OcrPreprocessor {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<Vec<u8>, ExtractionError> {
        validate_image_bytes(image_bytes)?;

        let img = image::load_from_memory(image_bytes).map_err(|e| {
            ExtractionError::ImageProcessing(format!("Failed to decode image: {e}"))
        })?;

        let gray = img.to_luma8();
        let threshold = otsu_threshold(&gray);
        let binary = binarize(&gray, threshold);
        let denoised = median_denoise(&binary);
        let (deskewed, angle) = deskew(&denoised);

        debug!(
            width = gray.width(),
            height = gray.height(),
            threshold,
            angle,
            "Preprocessed page image"
        );

        encode_png(deskewed)
    }
}

/// Pass-through preprocessor. Lets OCR run on the rendered image as-is.
#[derive(Debug, Clone, Default)]
pub struct NoopPreprocessor;

impl ImagePreprocessor for NoopPreprocessor {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<Vec<u8>, ExtractionError> {
        Ok(image_bytes.to_vec())
    }
}

// ═══════════════════════════════════════════════════════════
// Thresholding and denoising
// ═══════════════════════════════════════════════════════════

/// Global threshold maximizing between-class variance of the histogram.
pub fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for p in img.pixels() {
        histogram[p.0[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 127;
    }

    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &n)| v as f64 * n as f64)
        .sum();

    let mut best = 0u8;
    let mut best_variance = -1.0f64;
    let mut background = 0u64;
    let mut background_sum = 0.0f64;

    for t in 0..256usize {
        background += histogram[t];
        if background == 0 {
            continue;
        }
        let foreground = total - background;
        if foreground == 0 {
            break;
        }
        background_sum += t as f64 * histogram[t] as f64;

        let mean_b = background_sum / background as f64;
        let mean_f = (weighted_total - background_sum) / foreground as f64;
        let variance = background as f64 * foreground as f64 * (mean_b - mean_f).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best = t as u8;
        }
    }

    best
}

/// Pixels strictly above `threshold` become white, the rest black.
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        p.0[0] = if p.0[0] > threshold { 255 } else { 0 };
    }
    out
}

/// 3x3 median filter with replicated borders. Removes salt-and-pepper specks.
pub fn median_denoise(img: &GrayImage) -> GrayImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img.clone();
    }

    let mut out = GrayImage::new(w, h);
    let mut window = [0u8; 9];

    for y in 0..h {
        for x in 0..w {
            let mut i = 0;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let sx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                    let sy = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                    window[i] = img.get_pixel(sx, sy).0[0];
                    i += 1;
                }
            }
            window.sort_unstable();
            out.put_pixel(x, y, Luma([window[4]]));
        }
    }

    out
}

// ═══════════════════════════════════════════════════════════
// Deskew
// ═══════════════════════════════════════════════════════════

/// Straighten a page. Returns the image and the rotation actually applied.
pub fn deskew(img: &GrayImage) -> (GrayImage, f32) {
    let measured = estimate_skew_angle(img).unwrap_or(0.0);
    let angle = correction_angle(measured);
    if angle == 0.0 {
        return (img.clone(), 0.0);
    }
    (rotate_about_center(img, angle), angle)
}

/// Apply the spurious-angle and noise-floor rules to a measured skew.
pub fn correction_angle(measured: f32) -> f32 {
    if measured.abs() > MAX_SKEW_DEGREES || measured.abs() <= MIN_ROTATION_DEGREES {
        0.0
    } else {
        measured
    }
}

/// Median direction (degrees, y axis pointing down) of the dominant straight
/// edges. `None` when no line clears the vote floor.
pub fn estimate_skew_angle(img: &GrayImage) -> Option<f32> {
    let (w, h) = (img.width(), img.height());
    if w < 3 || h < 3 {
        return None;
    }

    let edges = edge_points(img);
    if edges.is_empty() {
        return None;
    }
    let stride = (edges.len() / HOUGH_MAX_POINTS).max(1);

    let angle_bins = (2.0 * HOUGH_ANGLE_RANGE / HOUGH_ANGLE_STEP) as usize + 1;
    let rho_offset = (w + h) as f32;
    let rho_bins = (2.0 * rho_offset / HOUGH_RHO_STEP) as usize + 1;

    let trig: Vec<(f32, f32)> = (0..angle_bins)
        .map(|a| {
            let rad = bin_angle(a).to_radians();
            (rad.sin(), rad.cos())
        })
        .collect();

    let mut acc = vec![0u32; angle_bins * rho_bins];
    for &(x, y) in edges.iter().step_by(stride) {
        let (xf, yf) = (x as f32, y as f32);
        for (a, &(sin, cos)) in trig.iter().enumerate() {
            let rho = yf * cos - xf * sin;
            let r = ((rho + rho_offset) / HOUGH_RHO_STEP) as usize;
            acc[a * rho_bins + r] += 1;
        }
    }

    let line_len = (w.min(h) / 3).clamp(MIN_LINE_VOTES, MAX_LINE_VOTES);
    let min_votes = (line_len / stride as u32).max(MIN_LINE_VOTES / 2);

    let mut peaks: Vec<(u32, f32)> = Vec::new();
    for a in 0..angle_bins {
        for r in 0..rho_bins {
            let votes = acc[a * rho_bins + r];
            if votes >= min_votes && is_local_peak(&acc, angle_bins, rho_bins, a, r) {
                peaks.push((votes, bin_angle(a)));
            }
        }
    }
    if peaks.is_empty() {
        return None;
    }

    peaks.sort_by(|x, y| y.0.cmp(&x.0));
    peaks.truncate(HOUGH_MAX_LINES);

    let mut angles: Vec<f32> = peaks.into_iter().map(|(_, a)| a).collect();
    let median = median(&mut angles);
    debug!(lines = angles.len(), median, "Estimated page skew");
    Some(median)
}

/// Rotate by `angle_deg` about the image center with nearest-neighbour sampling
/// and replicated borders. Lines at `angle_deg` come out horizontal.
pub fn rotate_about_center(img: &GrayImage, angle_deg: f32) -> GrayImage {
    let (w, h) = (img.width(), img.height());
    let mut out = GrayImage::new(w, h);
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);

    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let sx = (cx + dx * cos - dy * sin).round().clamp(0.0, (w - 1) as f32) as u32;
            let sy = (cy + dx * sin + dy * cos).round().clamp(0.0, (h - 1) as f32) as u32;
            out.put_pixel(x, y, *img.get_pixel(sx, sy));
        }
    }

    out
}

fn bin_angle(bin: usize) -> f32 {
    -HOUGH_ANGLE_RANGE + bin as f32 * HOUGH_ANGLE_STEP
}

fn edge_points(img: &GrayImage) -> Vec<(u32, u32)> {
    let (w, h) = (img.width(), img.height());
    let px = |x: u32, y: u32| img.get_pixel(x, y).0[0] as i32;
    let mut points = Vec::new();

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = (px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x - 1, y) + px(x - 1, y + 1));
            let gy = (px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x, y - 1) + px(x + 1, y - 1));
            if gx.abs() + gy.abs() > EDGE_MAGNITUDE {
                points.push((x, y));
            }
        }
    }

    points
}

fn is_local_peak(acc: &[u32], angle_bins: usize, rho_bins: usize, a: usize, r: usize) -> bool {
    let votes = acc[a * rho_bins + r];
    let a_lo = a.saturating_sub(2);
    let a_hi = (a + 2).min(angle_bins - 1);
    let r_lo = r.saturating_sub(2);
    let r_hi = (r + 2).min(rho_bins - 1);

    for na in a_lo..=a_hi {
        for nr in r_lo..=r_hi {
            if (na, nr) == (a, r) {
                continue;
            }
            let other = acc[na * rho_bins + nr];
            // Plateaus keep only their first cell.
            if other > votes || (other == votes && (na, nr) < (a, r)) {
                return false;
            }
        }
    }
    true
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(format!(
            "Image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

pub fn encode_png(img: GrayImage) -> Result<Vec<u8>, ExtractionError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}
