use egui::{Pos2, Vec2};
use image::Rgba;

use crate::components::history::SnapshotCommand;
use crate::ops::shapes::ShapeKind;

pub const MIN_PEN_WIDTH: u32 = 1;
pub const MAX_PEN_WIDTH: u32 = 50;

// ============================================================================
// TOOL — which behavior the next press gesture gets
// ============================================================================

/// The armed tool. Arming never mutates the canvas; it only decides what the
/// next press does. Shape and selection tools disarm back to freehand once
/// their gesture commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Freehand,
    Select,
    Shape(ShapeKind),
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Freehand => "Freehand",
            Tool::Select => "Select",
            Tool::Shape(kind) => kind.label(),
        }
    }
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Freehand
    }
}

// ============================================================================
// PEN — stroke color and width
// ============================================================================

/// Pen configuration read by every drawing operation. Mutated only through
/// the setters, which keep the width inside the dialog's 1–50 range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pen {
    color: Rgba<u8>,
    width: u32,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            color: Rgba([0, 0, 0, 255]),
            width: 1,
        }
    }
}

impl Pen {
    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.color = color;
    }

    /// Out-of-range widths are clamped rather than rejected.
    pub fn set_width(&mut self, width: u32) {
        self.width = width.clamp(MIN_PEN_WIDTH, MAX_PEN_WIDTH);
    }
}

// ============================================================================
// GESTURE — the per-drag state machine
// ============================================================================

/// The one active pointer gesture. Replaces the original design's pile of
/// independent mode booleans with a tagged union, so two modes can never be
/// active at once. Gestures that mutate the canvas incrementally carry their
/// pending history entry (captured pre-mutation) until release pushes it.
pub enum Gesture {
    /// No button held.
    Idle,
    /// Freehand stroke in progress; `last_pos` is the tail of the previous
    /// segment.
    Drawing {
        last_pos: Pos2,
        edit: SnapshotCommand,
    },
    /// Dragging out a new selection rectangle.
    Selecting { anchor: Pos2, cursor: Pos2 },
    /// Relocating the floating selection; `grab_offset` keeps the grab point
    /// under the pointer.
    MovingSelection { grab_offset: Vec2 },
    /// Sizing a pending shape; the committed geometry appears on release.
    PlacingShape {
        kind: ShapeKind,
        anchor: Pos2,
        cursor: Pos2,
        edit: SnapshotCommand,
    },
}

impl Default for Gesture {
    fn default() -> Self {
        Gesture::Idle
    }
}

impl Gesture {
    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Idle => "Idle",
            Gesture::Drawing { .. } => "Drawing",
            Gesture::Selecting { .. } => "Selecting",
            Gesture::MovingSelection { .. } => "MovingSelection",
            Gesture::PlacingShape { .. } => "PlacingShape",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pen_defaults_to_thin_black() {
        let pen = Pen::default();
        assert_eq!(pen.color(), Rgba([0, 0, 0, 255]));
        assert_eq!(pen.width(), 1);
    }

    #[test]
    fn pen_width_is_clamped_to_dialog_range() {
        let mut pen = Pen::default();
        pen.set_width(0);
        assert_eq!(pen.width(), MIN_PEN_WIDTH);
        pen.set_width(500);
        assert_eq!(pen.width(), MAX_PEN_WIDTH);
        pen.set_width(25);
        assert_eq!(pen.width(), 25);
    }

    #[test]
    fn pen_color_accepts_any_rgba() {
        let mut pen = Pen::default();
        pen.set_color(Rgba([12, 34, 56, 255]));
        assert_eq!(pen.color(), Rgba([12, 34, 56, 255]));
    }

    #[test]
    fn only_idle_is_inactive() {
        assert!(!Gesture::Idle.is_active());
        assert!(
            Gesture::Selecting {
                anchor: Pos2::ZERO,
                cursor: Pos2::ZERO,
            }
            .is_active()
        );
        assert_eq!(Gesture::Idle.name(), "Idle");
    }
}
