//! outline-pipeline: Pure image processing pipeline (sans-IO).
//!
//! Turns a decoded RGB image into an edge map and a contour overlay:
//! grayscale -> 5x5 Gaussian blur -> Canny (50/150) -> contour tracing
//! -> overlay rendering.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! byte slices and pixel grids; the HTTP surface lives in
//! `outline-server` and file handling in `outline-cli`.

pub mod blur;
pub mod canny;
pub mod codec;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod overlay;
pub mod types;

pub use codec::{CodecError, TransportImages};
pub use contour::{BorderKind, Contour, ContourSet};
pub use diagnostics::{Clock, PipelineDiagnostics, StdClock};
pub use edge::EdgeMap;
pub use types::{Dimensions, GrayImage, PipelineError, Point, ProcessingResult, RgbImage};

use diagnostics::{PipelineSummary, StageDiagnostics, StageMetrics};

/// Convert to intensity and smooth with the fixed 5x5 Gaussian kernel.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyImage`] for a zero-area input.
pub fn preprocess(image: &RgbImage) -> Result<GrayImage, PipelineError> {
    Dimensions::of(image).ensure_non_empty()?;
    Ok(blur::smooth(&grayscale::to_grayscale(image)))
}

/// Run the full pipeline on a decoded image.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyImage`] for a zero-area input, or any
/// error from overlay rendering.
pub fn process(image: &RgbImage) -> Result<ProcessingResult, PipelineError> {
    process_with_diagnostics(image, &StdClock)
}

/// Run the full pipeline, timing each stage with `clock`.
///
/// # Pipeline steps
///
/// 1. BT.601 grayscale conversion
/// 2. 5x5 Gaussian blur
/// 3. Canny edge detection with fixed thresholds
/// 4. Contour tracing with hierarchy and chain compression
/// 5. Overlay rendering
///
/// # Errors
///
/// Same as [`process`].
pub fn process_with_diagnostics<C: Clock>(
    image: &RgbImage,
    clock: &C,
) -> Result<ProcessingResult, PipelineError> {
    let dims = Dimensions::of(image).ensure_non_empty()?;
    let start = clock.now();

    // 1. Grayscale.
    let t = clock.now();
    let gray = grayscale::to_grayscale(image);
    let grayscale = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Grayscale {
            width: dims.width,
            height: dims.height,
        },
    };

    // 2. Blur.
    let t = clock.now();
    let smoothed = blur::smooth(&gray);
    let blur = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Blur {
            kernel_size: blur::KERNEL_SIZE,
            sigma: blur::derived_sigma(blur::KERNEL_SIZE),
        },
    };

    // 3. Edges.
    let t = clock.now();
    let edges = edge::extract_edges(&smoothed)?;
    let edge_pixel_count = edges.edge_pixel_count();
    let edge_detection = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::EdgeDetection {
            low_threshold: edge::CANNY_LOW,
            high_threshold: edge::CANNY_HIGH,
            edge_pixel_count,
            total_pixel_count: dims.pixel_count(),
        },
    };

    // 4. Contours.
    let t = clock.now();
    let contours = contour::find_contours(&edges);
    let contour_tracing = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: diagnostics::contour_metrics(&contours),
    };

    // 5. Overlay.
    let t = clock.now();
    let overlay = overlay::render_overlay(&contours, dims.width, dims.height)?;
    let overlay_stage = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Overlay {
            stroke_width: overlay::STROKE_WIDTH,
            polylines_drawn: contours.len(),
        },
    };

    let diagnostics = PipelineDiagnostics {
        grayscale,
        blur,
        edge_detection,
        contour_tracing,
        overlay: overlay_stage,
        total_duration: clock.elapsed(&start),
        summary: PipelineSummary {
            image_width: dims.width,
            image_height: dims.height,
            pixel_count: dims.pixel_count(),
            edge_pixel_count,
            contour_count: contours.len(),
        },
    };

    Ok(ProcessingResult {
        original: image.clone(),
        edges,
        overlay,
        diagnostics,
    })
}

/// Side length of the synthetic self-check image.
const SELF_CHECK_SIZE: u32 = 32;

/// Exercise codec and pipeline end to end on a synthetic image.
///
/// A white square on black is encoded, decoded, processed, and encoded
/// again. The square must yield edges and at least one contour.
///
/// # Errors
///
/// Returns the first codec or pipeline error, or
/// [`PipelineError::SelfCheck`] if the output is implausible.
pub fn self_check() -> Result<(), PipelineError> {
    let probe = RgbImage::from_fn(SELF_CHECK_SIZE, SELF_CHECK_SIZE, |x, y| {
        let inside = (8..24).contains(&x) && (8..24).contains(&y);
        image::Rgb(if inside { [255; 3] } else { [0; 3] })
    });

    let decoded = codec::decode(&codec::encode_png(&probe)?)?;
    if decoded != probe {
        return Err(PipelineError::SelfCheck("PNG round trip altered pixels"));
    }

    let result = process(&decoded)?;
    if result.edges.is_blank() {
        return Err(PipelineError::SelfCheck("no edges found on test pattern"));
    }
    if result.diagnostics.summary.contour_count == 0 {
        return Err(PipelineError::SelfCheck(
            "no contours found on test pattern",
        ));
    }

    TransportImages::encode(&result)?;
    Ok(())
}
