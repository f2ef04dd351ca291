//! Edge extraction: smoothed intensity grid in, binary [`EdgeMap`] out.
//!
//! The Canny thresholds are fixed constants of the system. Callers get
//! no knob for them; reproducing them exactly is what keeps edge maps
//! comparable across deployments.

use image::GrayImage;

use crate::canny;
use crate::types::{Dimensions, PipelineError};

/// Canny hysteresis low threshold (L1 gradient magnitude).
pub const CANNY_LOW: f32 = 50.0;

/// Canny hysteresis high threshold (L1 gradient magnitude).
pub const CANNY_HIGH: f32 = 150.0;
const _: () = assert!(CANNY_LOW < CANNY_HIGH);

/// Sample value of an edge pixel.
pub const EDGE: u8 = 255;

/// Sample value of a background pixel.
pub const BACKGROUND: u8 = 0;

/// A single-channel image whose samples are all [`EDGE`] or [`BACKGROUND`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap(GrayImage);

impl EdgeMap {
    /// Wrap a grayscale image after checking that it is binary.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotBinary`] at the first sample that is
    /// neither 0 nor 255.
    pub fn from_binary(image: GrayImage) -> Result<Self, PipelineError> {
        if let Some((x, y, p)) = image
            .enumerate_pixels()
            .find(|(_, _, p)| p.0[0] != EDGE && p.0[0] != BACKGROUND)
        {
            return Err(PipelineError::NotBinary {
                x,
                y,
                value: p.0[0],
            });
        }
        Ok(Self(image))
    }

    /// Borrow the underlying grid.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.0
    }

    /// Unwrap into the underlying grid.
    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.0
    }

    /// Width and height.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.0)
    }

    /// Number of edge pixels.
    #[must_use]
    pub fn edge_pixel_count(&self) -> u64 {
        self.0.pixels().map(|p| u64::from(p.0[0] == EDGE)).sum()
    }

    /// Returns `true` if no pixel is an edge.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.pixels().all(|p| p.0[0] == BACKGROUND)
    }
}

/// Detect edges with the fixed [`CANNY_LOW`] / [`CANNY_HIGH`] thresholds.
///
/// Gradient points above the high threshold are always edges; points
/// between low and high are edges only if connected to a strong edge;
/// points at or below the low threshold never are.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyImage`] for a zero-area input.
pub fn extract_edges(gray: &GrayImage) -> Result<EdgeMap, PipelineError> {
    Dimensions::of(gray).ensure_non_empty()?;
    Ok(EdgeMap(canny::canny(gray, CANNY_LOW, CANNY_HIGH)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn blank_image_produces_no_edges() {
        let img = GrayImage::from_pixel(20, 20, Luma([128]));
        let edges = extract_edges(&img).unwrap();
        assert_eq!(
            edges.dimensions(),
            Dimensions {
                width: 20,
                height: 20
            }
        );
        assert!(edges.is_blank());
        assert_eq!(edges.edge_pixel_count(), 0);
    }

    #[test]
    fn sharp_edge_detected() {
        let img = GrayImage::from_fn(20, 20, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        let edges = extract_edges(&img).unwrap();
        assert!(!edges.is_blank());
    }

    #[test]
    fn empty_input_is_rejected() {
        let result = extract_edges(&GrayImage::new(0, 4));
        assert!(matches!(result, Err(PipelineError::EmptyImage { .. })));
    }

    #[test]
    fn from_binary_accepts_zero_and_255() {
        let mut img = GrayImage::new(3, 3);
        img.put_pixel(1, 1, Luma([EDGE]));
        let map = EdgeMap::from_binary(img.clone()).unwrap();
        assert_eq!(map.edge_pixel_count(), 1);
        assert_eq!(map.into_image(), img);
    }

    #[test]
    fn from_binary_rejects_intermediate_values() {
        let mut img = GrayImage::new(3, 3);
        img.put_pixel(2, 1, Luma([128]));
        let err = EdgeMap::from_binary(img).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NotBinary {
                x: 2,
                y: 1,
                value: 128
            }
        ));
    }

    #[test]
    fn extracted_map_satisfies_binary_invariant() {
        #[allow(clippy::cast_possible_truncation)]
        let img = GrayImage::from_fn(40, 40, |x, y| Luma([((x * x + y * 31) % 256) as u8]));
        let edges = extract_edges(&img).unwrap();
        assert!(EdgeMap::from_binary(edges.into_image()).is_ok());
    }
}
