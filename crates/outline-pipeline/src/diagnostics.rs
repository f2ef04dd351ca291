//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Every call to [`process_with_diagnostics`](crate::process_with_diagnostics)
//! collects these alongside the grids. Time is read through the
//! [`Clock`] trait so tests can substitute a deterministic source.
//!
//! Durations serialize as plain seconds (`f64`).

use std::fmt::{self, Write as _};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::contour::{Contour, ContourSet};

/// A source of monotonic timestamps.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// `Duration` as an `f64` number of seconds.
mod seconds {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| D::Error::custom(format!("invalid duration {secs}: {e}")))
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: RGB to intensity.
    pub grayscale: StageDiagnostics,
    /// Stage 2: 5x5 Gaussian blur.
    pub blur: StageDiagnostics,
    /// Stage 3: Canny edge detection.
    pub edge_detection: StageDiagnostics,
    /// Stage 4: border following and chain compression.
    pub contour_tracing: StageDiagnostics,
    /// Stage 5: overlay rasterisation.
    pub overlay: StageDiagnostics,
    /// Wall-clock duration of the whole run (seconds).
    #[serde(with = "seconds")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "seconds")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Grayscale conversion.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Gaussian blur.
    Blur {
        /// Kernel side length.
        kernel_size: u32,
        /// Effective sigma.
        sigma: f32,
    },
    /// Canny edge detection.
    EdgeDetection {
        /// Low hysteresis threshold.
        low_threshold: f32,
        /// High hysteresis threshold.
        high_threshold: f32,
        /// Number of edge pixels in the output.
        edge_pixel_count: u64,
        /// Total pixel count, for edge density.
        total_pixel_count: u64,
    },
    /// Contour tracing.
    ContourTracing {
        /// Number of contours found.
        contour_count: usize,
        /// Number of those that are hole borders.
        hole_count: usize,
        /// Total vertices across all contours.
        total_point_count: usize,
        /// Fewest vertices in any single contour.
        min_contour_points: usize,
        /// Most vertices in any single contour.
        max_contour_points: usize,
        /// Mean vertices per contour.
        mean_contour_points: f64,
    },
    /// Overlay rendering.
    Overlay {
        /// Stroke width in pixels.
        stroke_width: f32,
        /// Number of polylines drawn.
        polylines_drawn: usize,
    },
}

/// High-level summary counts for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of edge pixels.
    pub edge_pixel_count: u64,
    /// Number of contours found.
    pub contour_count: usize,
}

impl PipelineDiagnostics {
    /// Stages in execution order with display names.
    #[must_use]
    pub const fn stages(&self) -> [(&'static str, &StageDiagnostics); 5] {
        [
            ("Grayscale", &self.grayscale),
            ("Blur", &self.blur),
            ("Edge Detection", &self.edge_detection),
            ("Contour Tracing", &self.contour_tracing),
            ("Overlay", &self.overlay),
        ]
    }

    /// Human-readable table of stage timings and metrics.
    #[must_use]
    pub fn report(&self) -> String {
        let total_ms = millis(self.total_duration);
        let summary = &self.summary;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "outline pipeline: {}x{} ({} px) in {total_ms:.3}ms",
            summary.image_width, summary.image_height, summary.pixel_count,
        );
        let _ = writeln!(out, "{:<16} {:>10} {:>7}  details", "stage", "ms", "share");
        for (name, stage) in self.stages() {
            let ms = millis(stage.duration);
            let share = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{name:<16} {ms:>10.3} {share:>6.1}%  {}",
                stage.metrics
            );
        }
        let _ = write!(
            out,
            "{} edge pixels, {} contours",
            summary.edge_pixel_count, summary.contour_count,
        );
        out
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl fmt::Display for StageMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grayscale { width, height } => write!(f, "{width}x{height}"),
            Self::Blur { kernel_size, sigma } => {
                write!(f, "{kernel_size}x{kernel_size} kernel, sigma {sigma:.2}")
            }
            Self::EdgeDetection {
                low_threshold,
                high_threshold,
                edge_pixel_count,
                total_pixel_count,
            } => {
                #[allow(clippy::cast_precision_loss)]
                let density = if *total_pixel_count == 0 {
                    0.0
                } else {
                    *edge_pixel_count as f64 * 100.0 / *total_pixel_count as f64
                };
                write!(
                    f,
                    "thresholds {low_threshold:.0}/{high_threshold:.0}, \
                     {edge_pixel_count} edge px ({density:.1}%)"
                )
            }
            Self::ContourTracing {
                contour_count,
                hole_count,
                total_point_count,
                min_contour_points,
                max_contour_points,
                mean_contour_points,
            } => write!(
                f,
                "{contour_count} contours ({hole_count} holes), {total_point_count} vertices \
                 [{min_contour_points}..{max_contour_points}, mean {mean_contour_points:.1}]"
            ),
            Self::Overlay {
                stroke_width,
                polylines_drawn,
            } => write!(f, "{polylines_drawn} polylines at {stroke_width:.0}px"),
        }
    }
}

/// Contour tracing metrics for a traced set.
pub(crate) fn contour_metrics(contours: &ContourSet) -> StageMetrics {
    let total = contours.total_points();
    let min = contours.iter().map(Contour::len).min().unwrap_or(0);
    let max = contours.iter().map(Contour::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if contours.is_empty() {
        0.0
    } else {
        total as f64 / contours.len() as f64
    };
    StageMetrics::ContourTracing {
        contour_count: contours.len(),
        hole_count: contours.hole_count(),
        total_point_count: total,
        min_contour_points: min,
        max_contour_points: max,
        mean_contour_points: mean,
    }
}
