//! Gaussian blur for noise reduction before edge detection.
//!
//! A separable square kernel applied in two passes (rows, then columns)
//! with reflect-101 border handling (`c b | a b c | b a`). A non-positive
//! sigma means "derive from the kernel size": small odd sizes use fixed
//! binomial tables, larger sizes use `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
//!
//! `imageproc::filter::separable_filter_equal` accepts the same fixed
//! taps, but it replicates edge pixels instead of reflecting them and
//! rounds back to `u8` between the row and column passes. Here the
//! intermediate stays in `f32` and is rounded once.

use image::GrayImage;

/// Side length of the preprocessing kernel.
pub const KERNEL_SIZE: u32 = 5;

/// Sigma of the preprocessing kernel; zero derives it from [`KERNEL_SIZE`].
pub const SIGMA: f32 = 0.0;

/// Fixed kernels used when sigma is derived, indexed by `size / 2`.
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.031_25, 0.109_375, 0.218_75, 0.281_25, 0.218_75, 0.109_375, 0.031_25,
    ],
];

/// Sigma implied by a kernel size when none is given.
#[must_use]
pub fn derived_sigma(size: u32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let size = size as f32;
    0.3f32.mul_add((size - 1.0).mul_add(0.5, -1.0), 0.8)
}

/// Build a normalized 1-D Gaussian kernel.
///
/// Even sizes are bumped to the next odd size so the kernel has a
/// center tap; a size of zero becomes 1 (identity).
#[must_use]
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let size = size | 1;

    if sigma <= 0.0
        && let Some(table) = SMALL_KERNELS.get((size / 2) as usize)
    {
        return table.to_vec();
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        derived_sigma(size)
    };
    let scale = -0.5 / (sigma * sigma);
    let center = (size / 2) as usize;

    #[allow(clippy::cast_precision_loss)]
    let weights: Vec<f32> = (0..size as usize)
        .map(|i| {
            let d = i.abs_diff(center) as f32;
            (scale * d * d).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Map a position in the padded signal back into `0..len` using
/// reflect-101.
///
/// `pos` is offset by `radius`: `pos == radius` is sample 0.
const fn reflect_101(pos: usize, radius: usize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    // Shift by whole periods first so the subtraction cannot underflow.
    let i = (pos + period * (radius / period + 1) - radius) % period;
    if i >= len { period - i } else { i }
}

/// Apply a `size`x`size` Gaussian blur to a grayscale image.
///
/// `sigma <= 0` derives sigma from `size`. Output has the same
/// dimensions as the input. An image with no pixels is returned as is.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, size: u32, sigma: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    let kernel = gaussian_kernel(size, sigma);
    let radius = kernel.len() / 2;
    let (wu, hu) = (w as usize, h as usize);
    let src = image.as_raw();

    // Rows.
    let mut horizontal = vec![0.0f32; wu * hu];
    for (src_row, out_row) in src.chunks_exact(wu).zip(horizontal.chunks_exact_mut(wu)) {
        for (x, out) in out_row.iter_mut().enumerate() {
            *out = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * f32::from(src_row[reflect_101(x + k, radius, wu)]))
                .sum();
        }
    }

    // Columns.
    let mut out = Vec::with_capacity(wu * hu);
    for y in 0..hu {
        for x in 0..wu {
            let acc: f32 = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * horizontal[reflect_101(y + k, radius, hu) * wu + x])
                .sum();
            out.push(round_to_u8(acc));
        }
    }

    GrayImage::from_raw(w, h, out).unwrap_or_else(|| image.clone())
}

/// The preprocessing blur: [`KERNEL_SIZE`] with derived sigma.
#[must_use = "returns the blurred image"]
pub fn smooth(image: &GrayImage) -> GrayImage {
    gaussian_blur(image, KERNEL_SIZE, SIGMA)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
