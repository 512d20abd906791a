use egui::{Pos2, Rect};
use image::Rgba;
use rayon::prelude::*;

use crate::canvas::CanvasState;

/// Shape primitives committed by a single drag gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Oval,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Oval => "Oval",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Line, ShapeKind::Rectangle, ShapeKind::Oval]
    }
}

// ============================================================================
// SDF functions — return signed distance (negative = inside)
// ============================================================================

/// SDF for a box centred at origin with half-extents (hx, hy).
#[inline]
fn sdf_box(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let dx = px.abs() - hx;
    let dy = py.abs() - hy;
    let outside = (dx.max(0.0) * dx.max(0.0) + dy.max(0.0) * dy.max(0.0)).sqrt();
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

/// SDF for an ellipse (approximation). Caller must guarantee positive radii.
#[inline]
fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    // Distance from the normalised circle surface, scaled back
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

/// Distance from a point to the segment a→b. A zero-length segment degrades
/// to point distance, which gives zero-length strokes a round dot.
#[inline]
fn segment_distance(px: f32, py: f32, a: Pos2, b: Pos2) -> f32 {
    let ex = b.x - a.x;
    let ey = b.y - a.y;
    let len2 = ex * ex + ey * ey;
    if len2 <= f32::EPSILON {
        let dx = px - a.x;
        let dy = py - a.y;
        return (dx * dx + dy * dy).sqrt();
    }
    let t = (((px - a.x) * ex + (py - a.y) * ey) / len2).clamp(0.0, 1.0);
    let cx = a.x + ex * t - px;
    let cy = a.y + ey * t - py;
    (cx * cx + cy * cy).sqrt()
}

// ============================================================================
// Rasterization
// ============================================================================

/// Paint every pixel whose distance (per `dist`) is within `half_width` in
/// `color`, scanning only the bounding box padded by the pen radius. Rows are
/// rasterized in parallel; pixels are sampled at their integer coordinates so
/// a width-1 stroke lands on exactly the dragged coordinates.
fn fill_band<F>(canvas: &mut CanvasState, bounds: Rect, half_width: f32, color: Rgba<u8>, dist: F)
where
    F: Fn(f32, f32) -> f32 + Sync,
{
    let w = canvas.width() as usize;
    let h = canvas.height() as usize;
    let pad = half_width + 1.0;
    let x0 = (bounds.min.x - pad).floor().max(0.0) as usize;
    let y0 = (bounds.min.y - pad).floor().max(0.0) as usize;
    let x1 = (((bounds.max.x + pad).ceil() + 1.0).max(0.0) as usize).min(w);
    let y1 = (((bounds.max.y + pad).ceil() + 1.0).max(0.0) as usize).min(h);
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    let row_bytes = w * 4;
    let rgba = color.0;
    let buf: &mut [u8] = canvas.image_mut();
    buf.par_chunks_mut(row_bytes)
        .enumerate()
        .skip(y0)
        .take(y1 - y0)
        .for_each(|(y, row)| {
            for x in x0..x1 {
                if dist(x as f32, y as f32) <= half_width {
                    let idx = x * 4;
                    row[idx..idx + 4].copy_from_slice(&rgba);
                }
            }
        });
}

/// Draw one round-capped stroke segment from `a` to `b` with the given pen.
/// Freehand strokes call this once per pointer move; round caps make
/// consecutive segments join seamlessly.
pub fn draw_segment(canvas: &mut CanvasState, a: Pos2, b: Pos2, color: Rgba<u8>, width: u32) {
    let half = width.max(1) as f32 * 0.5;
    let bounds = Rect::from_two_pos(a, b);
    fill_band(canvas, bounds, half, color, move |px, py| {
        segment_distance(px, py, a, b)
    });
}

/// Commit a shape dragged from `anchor` to `end`: a line between the two
/// points, or a rectangle outline / inscribed oval over their normalized
/// rectangle. Degenerate drags never panic: a zero-area rectangle collapses
/// to a pen dot and a zero-area oval draws nothing.
pub fn draw_shape(
    canvas: &mut CanvasState,
    kind: ShapeKind,
    anchor: Pos2,
    end: Pos2,
    color: Rgba<u8>,
    width: u32,
) {
    let half = width.max(1) as f32 * 0.5;
    let rect = Rect::from_two_pos(anchor, end);
    match kind {
        ShapeKind::Line => draw_segment(canvas, anchor, end, color, width),
        ShapeKind::Rectangle => {
            let center = rect.center();
            let hx = rect.width() * 0.5;
            let hy = rect.height() * 0.5;
            fill_band(canvas, rect, half, color, move |px, py| {
                sdf_box(px - center.x, py - center.y, hx, hy).abs()
            });
        }
        ShapeKind::Oval => {
            let rx = rect.width() * 0.5;
            let ry = rect.height() * 0.5;
            if rx <= 0.0 || ry <= 0.0 {
                return;
            }
            let center = rect.center();
            fill_band(canvas, rect, half, color, move |px, py| {
                sdf_ellipse(px - center.x, py - center.y, rx, ry).abs()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::WHITE;
    use egui::pos2;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn segment_covers_endpoints_and_midpoint() {
        let mut canvas = CanvasState::new(20, 20);
        draw_segment(&mut canvas, pos2(2.0, 4.0), pos2(14.0, 4.0), BLACK, 1);
        assert_eq!(canvas.get_pixel(2, 4), BLACK);
        assert_eq!(canvas.get_pixel(8, 4), BLACK);
        assert_eq!(canvas.get_pixel(14, 4), BLACK);
        // Off the stroke band.
        assert_eq!(canvas.get_pixel(8, 8), WHITE);
    }

    #[test]
    fn wide_segment_has_round_caps() {
        let mut canvas = CanvasState::new(20, 20);
        draw_segment(&mut canvas, pos2(6.0, 6.0), pos2(12.0, 6.0), BLACK, 5);
        // Cap extends past the endpoint by the pen radius.
        assert_eq!(canvas.get_pixel(4, 6), BLACK);
        assert_eq!(canvas.get_pixel(14, 6), BLACK);
        assert_eq!(canvas.get_pixel(3, 6), WHITE);
        // And above/below the segment body.
        assert_eq!(canvas.get_pixel(9, 4), BLACK);
        assert_eq!(canvas.get_pixel(9, 9), WHITE);
    }

    #[test]
    fn zero_length_segment_is_a_dot() {
        let mut canvas = CanvasState::new(10, 10);
        draw_segment(&mut canvas, pos2(5.0, 5.0), pos2(5.0, 5.0), BLACK, 3);
        assert_eq!(canvas.get_pixel(5, 5), BLACK);
        assert_eq!(canvas.get_pixel(8, 5), WHITE);
    }

    #[test]
    fn rectangle_outline_sits_on_normalized_bounds() {
        let mut canvas = CanvasState::new(64, 64);
        draw_shape(
            &mut canvas,
            ShapeKind::Rectangle,
            pos2(10.0, 10.0),
            pos2(50.0, 40.0),
            BLACK,
            1,
        );
        // Edge midpoints are painted, interior and exterior are not.
        assert_eq!(canvas.get_pixel(10, 25), BLACK);
        assert_eq!(canvas.get_pixel(50, 25), BLACK);
        assert_eq!(canvas.get_pixel(30, 10), BLACK);
        assert_eq!(canvas.get_pixel(30, 40), BLACK);
        assert_eq!(canvas.get_pixel(30, 25), WHITE);
        assert_eq!(canvas.get_pixel(5, 25), WHITE);
    }

    #[test]
    fn reversed_drag_yields_identical_rectangle() {
        let mut forward = CanvasState::new(64, 64);
        let mut reverse = CanvasState::new(64, 64);
        draw_shape(
            &mut forward,
            ShapeKind::Rectangle,
            pos2(10.0, 10.0),
            pos2(50.0, 40.0),
            BLACK,
            3,
        );
        draw_shape(
            &mut reverse,
            ShapeKind::Rectangle,
            pos2(50.0, 40.0),
            pos2(10.0, 10.0),
            BLACK,
            3,
        );
        assert_eq!(forward.image().as_raw(), reverse.image().as_raw());
    }

    #[test]
    fn oval_touches_edge_midpoints_not_center() {
        let mut canvas = CanvasState::new(64, 64);
        draw_shape(
            &mut canvas,
            ShapeKind::Oval,
            pos2(10.0, 10.0),
            pos2(50.0, 40.0),
            BLACK,
            1,
        );
        assert_eq!(canvas.get_pixel(10, 25), BLACK);
        assert_eq!(canvas.get_pixel(50, 25), BLACK);
        assert_eq!(canvas.get_pixel(30, 10), BLACK);
        assert_eq!(canvas.get_pixel(30, 40), BLACK);
        assert_eq!(canvas.get_pixel(30, 25), WHITE);
        // Bounding-box corner lies outside the inscribed oval.
        assert_eq!(canvas.get_pixel(10, 10), WHITE);
    }

    #[test]
    fn degenerate_shapes_do_not_panic() {
        let mut canvas = CanvasState::new(16, 16);
        draw_shape(&mut canvas, ShapeKind::Oval, pos2(4.0, 4.0), pos2(4.0, 4.0), BLACK, 3);
        // A zero-area oval draws nothing.
        assert!(canvas.image().pixels().all(|p| *p == WHITE));
        draw_shape(
            &mut canvas,
            ShapeKind::Rectangle,
            pos2(4.0, 4.0),
            pos2(4.0, 4.0),
            BLACK,
            3,
        );
        draw_shape(&mut canvas, ShapeKind::Line, pos2(8.0, 8.0), pos2(8.0, 8.0), BLACK, 1);
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let mut canvas = CanvasState::new(16, 16);
        draw_segment(&mut canvas, pos2(-10.0, 5.0), pos2(30.0, 5.0), BLACK, 3);
        assert_eq!(canvas.get_pixel(0, 5), BLACK);
        assert_eq!(canvas.get_pixel(15, 5), BLACK);
    }
}
