//! Canny edge detection on a pre-smoothed grayscale image.
//!
//! Derived from `imageproc::edges::canny` (0.26.0) with these changes:
//!
//! - **No internal blur.** `imageproc` always blurs with sigma 1.4
//!   first; here the caller has already smoothed the image with the
//!   5x5 preprocessing kernel, and a second blur would move the
//!   threshold response.
//! - **L1 gradient magnitude** `|gx| + |gy|`, the scale the 50/150
//!   thresholds are expressed in.
//! - **Asymmetric non-maximum suppression** on the horizontal and
//!   vertical bins: a pixel survives if it is strictly greater than the
//!   neighbor behind it and at least the one ahead, so a plateau two
//!   pixels wide thins to one pixel. The diagonal bins are strict on
//!   both sides.
//! - **Strict thresholds.** Strong means `> high`, weak means `> low`.
//! - **Hysteresis fixes** from imageproc#705 / #746: bounds-checked
//!   neighbors and all 8 neighbors visited.

use image::{GrayImage, Luma};
use imageproc::definitions::{HasBlack, HasWhite, Image};
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Quantized gradient direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Horizontal,
    Diagonal45,
    Vertical,
    Diagonal135,
}

impl Direction {
    fn from_gradient(gx: f32, gy: f32) -> Self {
        let mut angle = gy.atan2(gx).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }
        if (22.5..67.5).contains(&angle) {
            Self::Diagonal45
        } else if (67.5..112.5).contains(&angle) {
            Self::Vertical
        } else if (112.5..157.5).contains(&angle) {
            Self::Diagonal135
        } else {
            Self::Horizontal
        }
    }

    /// Neighbor offsets `(behind, ahead)` along the gradient.
    const fn neighbors(self, x: u32, y: u32) -> ((u32, u32), (u32, u32)) {
        match self {
            Self::Horizontal => ((x - 1, y), (x + 1, y)),
            Self::Diagonal45 => ((x - 1, y - 1), (x + 1, y + 1)),
            Self::Vertical => ((x, y - 1), (x, y + 1)),
            Self::Diagonal135 => ((x + 1, y - 1), (x - 1, y + 1)),
        }
    }
}

/// Run Canny edge detection.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge. The
/// outermost ring of pixels is never an edge. `low_threshold` is clamped
/// to at most `high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let low = low_threshold.min(high_threshold);

    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);

    let magnitude: Vec<f32> = gx
        .iter()
        .zip(gy.iter())
        .map(|(h, v)| f32::from(h.unsigned_abs()) + f32::from(v.unsigned_abs()))
        .collect();
    let Some(magnitude) = Image::<Luma<f32>>::from_raw(image.width(), image.height(), magnitude)
    else {
        return GrayImage::new(image.width(), image.height());
    };

    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
    hysteresis(&thinned, low, high_threshold)
}

/// Keep only local maxima along the gradient direction.
fn non_maximum_suppression(
    g: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    let (w, h) = g.dimensions();
    let mut out = Image::from_pixel(w, h, Luma([0.0f32]));
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let m = g.get_pixel(x, y).0[0];
            if m <= 0.0 {
                continue;
            }
            let direction = Direction::from_gradient(
                f32::from(gx.get_pixel(x, y).0[0]),
                f32::from(gy.get_pixel(x, y).0[0]),
            );
            let ((bx, by), (ax, ay)) = direction.neighbors(x, y);
            let behind = g.get_pixel(bx, by).0[0];
            let ahead = g.get_pixel(ax, ay).0[0];
            let keep = match direction {
                Direction::Horizontal | Direction::Vertical => m > behind && m >= ahead,
                Direction::Diagonal45 | Direction::Diagonal135 => m > behind && m > ahead,
            };
            if keep {
                out.put_pixel(x, y, Luma([m]));
            }
        }
    }
    out
}

/// Hysteresis thresholding by depth-first flood from strong pixels.
fn hysteresis(input: &Image<Luma<f32>>, low_thresh: f32, high_thresh: f32) -> GrayImage {
    let (w, h) = input.dimensions();
    let mut out = GrayImage::from_pixel(w, h, Luma::black());
    let mut stack = Vec::new();

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            if input.get_pixel(x, y).0[0] <= high_thresh || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, Luma::white());
            stack.push((x, y));

            while let Some((nx, ny)) = stack.pop() {
                let neighbors = [
                    (nx + 1, ny),
                    (nx + 1, ny + 1),
                    (nx, ny + 1),
                    (nx.wrapping_sub(1), ny.wrapping_sub(1)),
                    (nx.wrapping_sub(1), ny),
                    (nx.wrapping_sub(1), ny + 1),
                    (nx, ny.wrapping_sub(1)),
                    (nx + 1, ny.wrapping_sub(1)),
                ];
                for (cx, cy) in neighbors {
                    if cx >= w || cy >= h {
                        continue;
                    }
                    if input.get_pixel(cx, cy).0[0] > low_thresh && out.get_pixel(cx, cy).0[0] == 0
                    {
                        out.put_pixel(cx, cy, Luma::white());
                        stack.push((cx, cy));
                    }
                }
            }
        }
    }
    out
}
