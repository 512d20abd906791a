use egui::{Pos2, Rect};
use image::{Rgba, RgbaImage};

/// Opaque white — the canvas background and the fill left behind by a lifted
/// selection.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Extra room added on a growing axis when the window outgrows the canvas,
/// so that every single-pixel window resize does not reallocate the buffer.
pub const GROW_PADDING: u32 = 128;

// ============================================================================
// SELECTION — a rectangular region lifted off the canvas for relocation
// ============================================================================

/// A floating selection: pixels detached from the canvas, repositioned by
/// drags and composited back on release.
pub struct Selection {
    /// Current position/size on the canvas, in canvas coordinates.
    /// Integer-valued at capture; moves fractionally during a drag.
    pub rect: Rect,
    /// The pixels captured when the selection was lifted.
    pub pixels: RgbaImage,
}

impl Selection {
    /// True if `pos` (canvas coordinates) falls inside the selection.
    pub fn contains(&self, pos: Pos2) -> bool {
        self.rect.contains(pos)
    }
}

// ============================================================================
// CANVAS STATE — the document raster buffer
// ============================================================================

/// The single mutable raster buffer representing the document, plus the
/// floating selection (if any).
pub struct CanvasState {
    pixels: RgbaImage,
    /// Floating selection lifted off the canvas, if one exists.
    pub selection: Option<Selection>,
    /// Bumped on every visible change; the view re-uploads its display
    /// texture when this moves.
    pub dirty_generation: u64,
}

impl CanvasState {
    /// Create a white canvas. Zero dimensions are clamped to 1×1 so the
    /// buffer always has positive extent.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = if width == 0 || height == 0 {
            crate::log_warn!(
                "CanvasState::new: degenerate dimensions {}x{}, clamped to 1x1",
                width,
                height
            );
            (width.max(1), height.max(1))
        } else {
            (width, height)
        };
        Self {
            pixels: RgbaImage::from_pixel(width, height, WHITE),
            selection: None,
            dirty_generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Mutable access to the raster buffer. Bumps the dirty generation —
    /// callers are assumed to be about to paint.
    pub fn image_mut(&mut self) -> &mut RgbaImage {
        self.mark_dirty();
        &mut self.pixels
    }

    /// Replace the buffer wholesale (open, undo restore).
    pub fn set_image(&mut self, image: RgbaImage) {
        self.pixels = image;
        self.mark_dirty();
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty_generation = self.dirty_generation.wrapping_add(1);
    }

    // ---- region operations -------------------------------------------------

    /// Fill the whole canvas with `color`.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.pixels.pixels_mut() {
            *px = color;
        }
        self.mark_dirty();
    }

    /// Fill a rectangle (canvas coordinates, clamped to the buffer).
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let (x0, y0, x1, y1) = self.clamp_rect(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                self.pixels.put_pixel(x, y, color);
            }
        }
        self.mark_dirty();
    }

    /// Copy the pixels inside `rect` (clamped) into a detached buffer.
    pub fn copy_region(&self, rect: Rect) -> RgbaImage {
        let (x0, y0, x1, y1) = self.clamp_rect(rect);
        let w = x1 - x0;
        let h = y1 - y0;
        let mut out = RgbaImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                out.put_pixel(x, y, *self.pixels.get_pixel(x0 + x, y0 + y));
            }
        }
        out
    }

    /// Overwrite-blit `top` onto the canvas with its top-left corner at
    /// `(x, y)`. Areas falling outside the canvas are clipped away; no
    /// alpha blending — source pixels replace destination pixels.
    pub fn blit(&mut self, top: &RgbaImage, x: i64, y: i64) {
        let w = self.pixels.width() as i64;
        let h = self.pixels.height() as i64;
        for sy in 0..top.height() as i64 {
            let dy = y + sy;
            if dy < 0 || dy >= h {
                continue;
            }
            for sx in 0..top.width() as i64 {
                let dx = x + sx;
                if dx < 0 || dx >= w {
                    continue;
                }
                self.pixels
                    .put_pixel(dx as u32, dy as u32, *top.get_pixel(sx as u32, sy as u32));
            }
        }
        self.mark_dirty();
    }

    /// Grow the canvas so it is at least `min_w` × `min_h`, adding
    /// [`GROW_PADDING`] on each growing axis and preserving existing content
    /// at the origin. Never shrinks. Returns true if the buffer was
    /// reallocated.
    pub fn grow_to(&mut self, min_w: u32, min_h: u32) -> bool {
        let cur_w = self.pixels.width();
        let cur_h = self.pixels.height();
        if min_w <= cur_w && min_h <= cur_h {
            return false;
        }
        let new_w = if min_w > cur_w { min_w + GROW_PADDING } else { cur_w };
        let new_h = if min_h > cur_h { min_h + GROW_PADDING } else { cur_h };

        let mut grown = RgbaImage::from_pixel(new_w, new_h, WHITE);
        for y in 0..cur_h {
            for x in 0..cur_w {
                grown.put_pixel(x, y, *self.pixels.get_pixel(x, y));
            }
        }
        self.pixels = grown;
        self.mark_dirty();
        true
    }

    // ---- selection lifecycle -----------------------------------------------

    /// Lift the pixels inside `rect` into a floating selection and clear the
    /// source region to white. A rectangle that rounds to zero area creates
    /// no selection and leaves the canvas untouched; returns whether a
    /// selection was created.
    pub fn lift_selection(&mut self, rect: Rect) -> bool {
        let (x0, y0, x1, y1) = self.clamp_rect(rect);
        if x1 <= x0 || y1 <= y0 {
            return false;
        }
        let clamped = Rect::from_min_max(
            Pos2::new(x0 as f32, y0 as f32),
            Pos2::new(x1 as f32, y1 as f32),
        );
        let pixels = self.copy_region(clamped);
        self.fill_rect(clamped, WHITE);
        self.selection = Some(Selection {
            rect: clamped,
            pixels,
        });
        true
    }

    /// Composite the floating selection back onto the canvas at its current
    /// rectangle and drop it. No-op when no selection is floating.
    pub fn commit_selection(&mut self) {
        if let Some(sel) = self.selection.take() {
            let x = sel.rect.min.x.round() as i64;
            let y = sel.rect.min.y.round() as i64;
            self.blit(&sel.pixels, x, y);
        }
    }

    /// Clamp a (possibly fractional, possibly out-of-bounds) rectangle to
    /// integer pixel bounds inside the buffer.
    fn clamp_rect(&self, rect: Rect) -> (u32, u32, u32, u32) {
        let w = self.pixels.width() as f32;
        let h = self.pixels.height() as f32;
        let x0 = rect.min.x.round().clamp(0.0, w) as u32;
        let y0 = rect.min.y.round().clamp(0.0, h) as u32;
        let x1 = rect.max.x.round().clamp(0.0, w) as u32;
        let y1 = rect.max.y.round().clamp(0.0, h) as u32;
        (x0, y0, x1.max(x0), y1.max(y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Rect {
        Rect::from_min_max(Pos2::new(x0, y0), Pos2::new(x1, y1))
    }

    #[test]
    fn new_canvas_is_white() {
        let canvas = CanvasState::new(8, 6);
        assert_eq!(canvas.width(), 8);
        assert_eq!(canvas.height(), 6);
        assert!(canvas.image().pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn degenerate_dimensions_are_clamped() {
        let canvas = CanvasState::new(0, 5);
        assert_eq!(canvas.width(), 1);
        assert_eq!(canvas.height(), 5);
    }

    #[test]
    fn fill_rect_is_clamped_to_bounds() {
        let mut canvas = CanvasState::new(4, 4);
        canvas.fill_rect(rect(2.0, 2.0, 100.0, 100.0), RED);
        assert_eq!(canvas.get_pixel(3, 3), RED);
        assert_eq!(canvas.get_pixel(1, 1), WHITE);
    }

    #[test]
    fn blit_clips_negative_offsets() {
        let mut canvas = CanvasState::new(4, 4);
        let patch = RgbaImage::from_pixel(3, 3, RED);
        canvas.blit(&patch, -2, -2);
        assert_eq!(canvas.get_pixel(0, 0), RED);
        assert_eq!(canvas.get_pixel(1, 1), WHITE);
    }

    #[test]
    fn grow_preserves_content_and_pads() {
        let mut canvas = CanvasState::new(10, 10);
        canvas.fill_rect(rect(0.0, 0.0, 10.0, 10.0), RED);
        assert!(canvas.grow_to(20, 10));
        assert_eq!(canvas.width(), 20 + GROW_PADDING);
        assert_eq!(canvas.height(), 10);
        // Old content intact at the origin, new area white.
        assert_eq!(canvas.get_pixel(9, 9), RED);
        assert_eq!(canvas.get_pixel(10, 0), WHITE);
    }

    #[test]
    fn grow_never_shrinks() {
        let mut canvas = CanvasState::new(50, 50);
        assert!(!canvas.grow_to(10, 10));
        assert_eq!(canvas.width(), 50);
        assert_eq!(canvas.height(), 50);
    }

    #[test]
    fn lift_selection_whitens_source_and_captures_pixels() {
        let mut canvas = CanvasState::new(10, 10);
        canvas.fill_rect(rect(2.0, 2.0, 6.0, 6.0), RED);
        assert!(canvas.lift_selection(rect(2.0, 2.0, 6.0, 6.0)));

        let sel = canvas.selection.as_ref().unwrap();
        assert_eq!(sel.pixels.dimensions(), (4, 4));
        assert!(sel.pixels.pixels().all(|p| *p == RED));
        // Source region is now white.
        assert_eq!(canvas.get_pixel(3, 3), WHITE);
    }

    #[test]
    fn zero_area_selection_is_rejected() {
        let mut canvas = CanvasState::new(10, 10);
        assert!(!canvas.lift_selection(rect(4.0, 4.0, 4.0, 4.0)));
        assert!(canvas.selection.is_none());
    }

    #[test]
    fn commit_selection_pastes_at_moved_rect() {
        let mut canvas = CanvasState::new(10, 10);
        canvas.fill_rect(rect(0.0, 0.0, 2.0, 2.0), RED);
        assert!(canvas.lift_selection(rect(0.0, 0.0, 2.0, 2.0)));

        let sel = canvas.selection.as_mut().unwrap();
        sel.rect = sel.rect.translate(egui::vec2(5.0, 5.0));
        canvas.commit_selection();

        assert!(canvas.selection.is_none());
        assert_eq!(canvas.get_pixel(0, 0), WHITE);
        assert_eq!(canvas.get_pixel(5, 5), RED);
        assert_eq!(canvas.get_pixel(6, 6), RED);
    }
}
