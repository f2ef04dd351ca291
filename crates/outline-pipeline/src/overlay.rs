//! Overlay rendering: draw contours onto a black canvas.
//!
//! Every contour is stroked as a closed polyline through its vertices,
//! green, 2 pixels wide, without anti-aliasing so the canvas holds only
//! pure black and pure green. Coordinates are shifted to pixel centers
//! (`+0.5`) so a vertex at `(x, y)` lights pixel `(x, y)`.

use image::RgbImage;
use tiny_skia::{Color, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::contour::{Contour, ContourSet};
use crate::types::{Dimensions, PipelineError};

/// Stroke color as RGB.
pub const OVERLAY_COLOR: [u8; 3] = [0, 255, 0];

/// Stroke width in pixels.
pub const STROKE_WIDTH: f32 = 2.0;

/// Draw `contours` on a `width` x `height` black canvas.
///
/// Hierarchy is ignored: holes and nested borders are drawn like any
/// other contour. A single-vertex contour becomes a 2x2 dot.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyImage`] if either side is zero,
/// [`PipelineError::ContourOutOfBounds`] if any vertex lies outside the
/// canvas, or [`PipelineError::Render`] if the rasteriser cannot
/// allocate the canvas.
pub fn render_overlay(
    contours: &ContourSet,
    width: u32,
    height: u32,
) -> Result<RgbImage, PipelineError> {
    let dims = Dimensions { width, height }.ensure_non_empty()?;
    check_bounds(contours, dims)?;

    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return Err(PipelineError::Render(format!(
            "cannot allocate {width}x{height} canvas"
        )));
    };
    pixmap.fill(Color::BLACK);

    let [r, g, b] = OVERLAY_COLOR;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = false;

    let stroke = Stroke {
        width: STROKE_WIDTH,
        line_join: LineJoin::Miter,
        ..Stroke::default()
    };

    for contour in contours {
        draw_contour(&mut pixmap, contour, &paint, &stroke);
    }

    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| PipelineError::Render("pixmap size mismatch".to_owned()))
}

fn check_bounds(contours: &ContourSet, dims: Dimensions) -> Result<(), PipelineError> {
    contours
        .iter()
        .flat_map(Contour::points)
        .find(|p| !dims.contains(**p))
        .map_or(Ok(()), |p| {
            Err(PipelineError::ContourOutOfBounds {
                x: p.x,
                y: p.y,
                width: dims.width,
                height: dims.height,
            })
        })
}

#[allow(clippy::cast_precision_loss)]
fn draw_contour(pixmap: &mut Pixmap, contour: &Contour, paint: &Paint<'_>, stroke: &Stroke) {
    let points = contour.points();
    match points {
        [] => {}
        [only] => {
            let (x, y) = (only.x as f32, only.y as f32);
            if let Some(dot) = Rect::from_xywh(x, y, STROKE_WIDTH, STROKE_WIDTH) {
                pixmap.fill_rect(dot, paint, Transform::identity(), None);
            }
        }
        [first, rest @ ..] => {
            let mut pb = PathBuilder::new();
            pb.move_to(first.x as f32 + 0.5, first.y as f32 + 0.5);
            for p in rest {
                pb.line_to(p.x as f32 + 0.5, p.y as f32 + 0.5);
            }
            pb.close();
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::contour::BorderKind;
    use crate::types::Point;

    const GREEN: [u8; 3] = OVERLAY_COLOR;
    const BLACK: [u8; 3] = [0, 0, 0];

    fn single(points: Vec<Point>) -> ContourSet {
        ContourSet::from_contours(vec![Contour::new(points, BorderKind::Outer, None)])
    }

    fn square() -> ContourSet {
        single(vec![
            Point::new(30, 30),
            Point::new(30, 69),
            Point::new(69, 69),
            Point::new(69, 30),
        ])
    }

    #[test]
    fn no_contours_gives_black_canvas() {
        let img = render_overlay(&ContourSet::default(), 8, 5).unwrap();
        assert_eq!(img.dimensions(), (8, 5));
        assert!(img.pixels().all(|p| p.0 == BLACK));
    }

    #[test]
    fn square_outline_is_green_and_interior_black() {
        let img = render_overlay(&square(), 100, 100).unwrap();
        assert_eq!(img.get_pixel(30, 30).0, GREEN);
        assert_eq!(img.get_pixel(50, 30).0, GREEN);
        assert_eq!(img.get_pixel(30, 50).0, GREEN);
        assert_eq!(img.get_pixel(69, 50).0, GREEN);
        assert_eq!(img.get_pixel(50, 69).0, GREEN);
        assert_eq!(img.get_pixel(50, 50).0, BLACK);
        assert_eq!(img.get_pixel(5, 5).0, BLACK);
    }

    #[test]
    fn only_black_and_green_pixels() {
        let set = single(vec![
            Point::new(1, 1),
            Point::new(17, 4),
            Point::new(9, 15),
        ]);
        let img = render_overlay(&set, 20, 20).unwrap();
        assert!(img.pixels().all(|p| p.0 == BLACK || p.0 == GREEN));
        assert!(img.pixels().any(|p| p.0 == GREEN));
    }

    #[test]
    fn single_vertex_is_a_dot() {
        let img = render_overlay(&single(vec![Point::new(3, 3)]), 8, 8).unwrap();
        assert_eq!(img.get_pixel(3, 3).0, GREEN);
        assert_eq!(img.get_pixel(4, 4).0, GREEN);
        assert_eq!(img.get_pixel(6, 6).0, BLACK);
    }

    #[test]
    fn dot_on_last_pixel_is_clipped() {
        let img = render_overlay(&single(vec![Point::new(4, 4)]), 5, 5).unwrap();
        assert_eq!(img.get_pixel(4, 4).0, GREEN);
    }

    #[test]
    fn empty_canvas_is_rejected() {
        let err = render_overlay(&ContourSet::default(), 0, 10).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyImage {
                width: 0,
                height: 10
            }
        ));
    }

    #[test]
    fn out_of_bounds_vertex_is_rejected() {
        let set = single(vec![Point::new(2, 2), Point::new(10, 2)]);
        let err = render_overlay(&set, 10, 10).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ContourOutOfBounds {
                x: 10,
                y: 2,
                width: 10,
                height: 10
            }
        ));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(
            render_overlay(&square(), 100, 100).unwrap(),
            render_overlay(&square(), 100, 100).unwrap()
        );
    }
}
