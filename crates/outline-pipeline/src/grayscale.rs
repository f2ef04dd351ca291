//! RGB to single-channel intensity conversion.
//!
//! Uses the BT.601 luma weights `0.299*R + 0.587*G + 0.114*B` in 14-bit
//! fixed point, with round-half-up. The `image` crate's own `to_luma8`
//! uses BT.709 weights, which would shift every edge threshold, so the
//! conversion is done here explicitly.

use image::{GrayImage, Luma, RgbImage};

/// Fixed-point shift for the luma weights.
const LUMA_SHIFT: u32 = 14;

/// BT.601 weights scaled by `1 << LUMA_SHIFT`. They sum to exactly
/// `1 << LUMA_SHIFT`, so white maps to 255 and black to 0.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const _: () = assert!(R_WEIGHT + G_WEIGHT + B_WEIGHT == 1 << LUMA_SHIFT);

/// Luma of a single RGB sample.
#[must_use]
pub fn luma_of(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    let y = (r * R_WEIGHT + g * G_WEIGHT + b * B_WEIGHT + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT;
    // The weights sum to 1 << LUMA_SHIFT, so y <= 255.
    u8::try_from(y).unwrap_or(u8::MAX)
}

/// Convert an RGB grid to a single-channel intensity grid of the same size.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([luma_of(image.get_pixel(x, y).0)])
    })
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn white_and_black_are_preserved() {
        assert_eq!(luma_of([255, 255, 255]), 255);
        assert_eq!(luma_of([0, 0, 0]), 0);
    }

    #[test]
    fn gray_input_is_unchanged() {
        for v in [1u8, 17, 64, 128, 200, 254] {
            assert_eq!(luma_of([v, v, v]), v, "gray level {v}");
        }
    }

    #[test]
    fn primaries_match_bt601() {
        // 0.299 * 255 = 76.2, 0.587 * 255 = 149.7, 0.114 * 255 = 29.1
        assert_eq!(luma_of([255, 0, 0]), 76);
        assert_eq!(luma_of([0, 255, 0]), 150);
        assert_eq!(luma_of([0, 0, 255]), 29);
    }

    #[test]
    fn green_is_brightest_primary() {
        let r = luma_of([255, 0, 0]);
        let g = luma_of([0, 255, 0]);
        let b = luma_of([0, 0, 255]);
        assert!(
            g > r && r > b,
            "expected green > red > blue luminance, got R={r} G={g} B={b}",
        );
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = RgbImage::from_pixel(17, 31, Rgb([128, 64, 32]));
        let gray = to_grayscale(&img);
        assert_eq!(gray.dimensions(), (17, 31));
    }

    #[test]
    fn per_pixel_conversion() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let gray = to_grayscale(&img);
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 29);
    }
}
