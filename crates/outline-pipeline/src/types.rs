//! Shared types for the outline image processing pipeline.

use serde::{Deserialize, Serialize};

use crate::diagnostics::PipelineDiagnostics;
use crate::edge::EdgeMap;

/// Re-export `GrayImage` so downstream crates can reference
/// single-channel intermediates without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the decoded
/// original and the overlay without depending on `image` directly.
pub use image::RgbImage;

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// Column (pixels from left edge).
    pub x: u32,
    /// Row (pixels from top edge).
    pub y: u32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Step from `self` to `next` as a signed `(dx, dy)` pair.
    #[must_use]
    pub fn step_to(self, next: Self) -> (i64, i64) {
        (
            i64::from(next.x) - i64::from(self.x),
            i64::from(next.y) - i64::from(self.y),
        )
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of any `image` buffer.
    #[must_use]
    pub fn of<I: image::GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    /// Total pixel count.
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Fails with [`PipelineError::EmptyImage`] when either side is zero.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyImage`] for a zero-area grid.
    pub const fn ensure_non_empty(self) -> Result<Self, PipelineError> {
        if self.is_empty() {
            Err(PipelineError::EmptyImage {
                width: self.width,
                height: self.height,
            })
        } else {
            Ok(self)
        }
    }

    /// Returns `true` if `point` lies inside `[0, width) x [0, height)`.
    #[must_use]
    pub const fn contains(self, point: Point) -> bool {
        point.x < self.width && point.y < self.height
    }
}

/// Errors raised by the processing stages.
///
/// Decoding and encoding failures live in [`crate::codec::CodecError`];
/// everything here happens after a valid image is in memory.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage received a grid with no pixels.
    #[error("image has zero area ({width}x{height})")]
    EmptyImage {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// A grid expected to be binary contained an intermediate sample.
    #[error("edge map sample at ({x}, {y}) is {value}, expected 0 or 255")]
    NotBinary {
        /// Column of the offending sample.
        x: u32,
        /// Row of the offending sample.
        y: u32,
        /// The sample value.
        value: u8,
    },

    /// A contour vertex lies outside the canvas it is drawn on.
    #[error("contour vertex ({x}, {y}) outside {width}x{height} canvas")]
    ContourOutOfBounds {
        /// Column of the offending vertex.
        x: u32,
        /// Row of the offending vertex.
        y: u32,
        /// Canvas width.
        width: u32,
        /// Canvas height.
        height: u32,
    },

    /// The rasteriser could not produce an overlay.
    #[error("overlay rendering failed: {0}")]
    Render(String),

    /// The startup self-check produced an implausible result.
    #[error("self-check failed: {0}")]
    SelfCheck(&'static str),

    /// Codec failure inside a stage (self-check round trip).
    #[error(transparent)]
    Codec(#[from] crate::codec::CodecError),
}

/// Result of running the full image processing pipeline.
///
/// Holds the three grids returned to a client plus the per-stage
/// diagnostics of the run. Exists for one request only.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The decoded input, unchanged.
    pub original: RgbImage,
    /// Binary Canny edge map.
    pub edges: EdgeMap,
    /// Contours drawn in green on a black canvas.
    pub overlay: RgbImage,
    /// Timing and counts for each stage.
    pub diagnostics: PipelineDiagnostics,
}

impl ProcessingResult {
    /// Dimensions shared by all three grids.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.original)
    }
}
