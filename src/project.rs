use std::path::Path;

use egui::{Pos2, Rect};

use crate::canvas::{CanvasState, WHITE};
use crate::components::history::{HistoryManager, SnapshotCommand};
use crate::components::tools::{Gesture, Pen, Tool};
use crate::io::{FileError, FileHandler};
use crate::ops::shapes;

/// The open document and its controller: exclusively owns the canvas, pen,
/// history, and gesture/selection state, and translates pointer events into
/// buffer mutations. The window shell forwards events here and renders
/// whatever this struct says.
pub struct Project {
    pub canvas: CanvasState,
    pub history: HistoryManager,
    pub file_handler: FileHandler,
    pen: Pen,
    tool: Tool,
    gesture: Gesture,
    pub is_dirty: bool,
    /// Display name (derived from path, or "Untitled")
    pub name: String,
}

impl Project {
    pub fn new_untitled(width: u32, height: u32) -> Self {
        Self {
            canvas: CanvasState::new(width, height),
            history: HistoryManager::default(),
            file_handler: FileHandler::new(),
            pen: Pen::default(),
            tool: Tool::default(),
            gesture: Gesture::Idle,
            is_dirty: false,
            name: "Untitled".to_string(),
        }
    }

    // ---- presentation ------------------------------------------------------

    /// Window/tab title: document name with a dirty marker.
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.file_handler.current_path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// The rectangle the view should overlay with dashes: an in-progress
    /// selection or shape drag, otherwise the floating selection (which stays
    /// outlined until it is committed).
    pub fn overlay_rect(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::Selecting { anchor, cursor } => Some(Rect::from_two_pos(*anchor, *cursor)),
            Gesture::PlacingShape { anchor, cursor, .. } => {
                Some(Rect::from_two_pos(*anchor, *cursor))
            }
            _ => self.canvas.selection.as_ref().map(|s| s.rect),
        }
    }

    // ---- tool & pen configuration ------------------------------------------

    pub fn active_tool(&self) -> Tool {
        self.tool
    }

    /// Arm a tool for the next press gesture. Never mutates the canvas.
    pub fn arm_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn pen(&self) -> &Pen {
        &self.pen
    }

    pub fn set_pen_width(&mut self, width: u32) {
        self.pen.set_width(width);
    }

    pub fn set_pen_color(&mut self, color: image::Rgba<u8>) {
        self.pen.set_color(color);
    }

    pub fn gesture_active(&self) -> bool {
        self.gesture.is_active()
    }

    // ---- pointer state machine ---------------------------------------------

    /// Primary button pressed at `pos` (canvas coordinates).
    pub fn pointer_pressed(&mut self, pos: Pos2) {
        if self.gesture.is_active() {
            return;
        }

        if self.tool == Tool::Select {
            self.gesture = Gesture::Selecting {
                anchor: pos,
                cursor: pos,
            };
            return;
        }

        // A press inside the floating selection grabs it, whatever else is
        // armed; the offset keeps the grab point under the pointer.
        let grab = self
            .canvas
            .selection
            .as_ref()
            .filter(|sel| sel.contains(pos))
            .map(|sel| pos - sel.rect.min);
        if let Some(grab_offset) = grab {
            self.gesture = Gesture::MovingSelection { grab_offset };
            return;
        }

        if let Tool::Shape(kind) = self.tool {
            self.gesture = Gesture::PlacingShape {
                kind,
                anchor: pos,
                cursor: pos,
                // Pre-mutation snapshot: the commit on release will paint.
                edit: SnapshotCommand::new(kind.label(), &self.canvas),
            };
        } else {
            self.gesture = Gesture::Drawing {
                last_pos: pos,
                edit: SnapshotCommand::new("Stroke", &self.canvas),
            };
        }
    }

    /// Pointer moved to `pos` while the primary button is held.
    pub fn pointer_moved(&mut self, pos: Pos2) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Drawing { last_pos, .. } => {
                shapes::draw_segment(
                    &mut self.canvas,
                    *last_pos,
                    pos,
                    self.pen.color(),
                    self.pen.width(),
                );
                *last_pos = pos;
                self.is_dirty = true;
            }
            Gesture::Selecting { cursor, .. } => *cursor = pos,
            Gesture::MovingSelection { grab_offset } => {
                // Overlay-only: pixels stay put until release.
                if let Some(sel) = &mut self.canvas.selection {
                    sel.rect = Rect::from_min_size(pos - *grab_offset, sel.rect.size());
                }
            }
            Gesture::PlacingShape { cursor, .. } => *cursor = pos,
        }
    }

    /// Primary button released at `pos`.
    pub fn pointer_released(&mut self, pos: Pos2) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {}
            Gesture::Drawing { mut edit, .. } => {
                // Segments were committed incrementally during the drag.
                edit.set_after(&self.canvas);
                self.history.push(Box::new(edit));
            }
            Gesture::Selecting { anchor, .. } => {
                let rect = Rect::from_two_pos(anchor, pos);
                let mut edit = SnapshotCommand::new("Select", &self.canvas);
                if self.canvas.lift_selection(rect) {
                    edit.set_after(&self.canvas);
                    self.history.push(Box::new(edit));
                    self.is_dirty = true;
                }
                // Selection arming is one-shot; the lifted region is now
                // grabbed by pressing inside it.
                self.tool = Tool::Freehand;
            }
            Gesture::MovingSelection { grab_offset } => {
                if let Some(sel) = &mut self.canvas.selection {
                    sel.rect = Rect::from_min_size(pos - grab_offset, sel.rect.size());
                }
                let mut edit = SnapshotCommand::new("Move Selection", &self.canvas);
                self.canvas.commit_selection();
                edit.set_after(&self.canvas);
                self.history.push(Box::new(edit));
                self.is_dirty = true;
            }
            Gesture::PlacingShape {
                kind,
                anchor,
                mut edit,
                ..
            } => {
                shapes::draw_shape(
                    &mut self.canvas,
                    kind,
                    anchor,
                    pos,
                    self.pen.color(),
                    self.pen.width(),
                );
                edit.set_after(&self.canvas);
                self.history.push(Box::new(edit));
                self.is_dirty = true;
                self.tool = Tool::Freehand;
            }
        }
    }

    // ---- document operations -----------------------------------------------

    /// Undo the last edit. Silent no-op on an empty stack; returns the undone
    /// command's description for the status line.
    pub fn undo(&mut self) -> Option<String> {
        self.history.undo(&mut self.canvas)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.history.redo(&mut self.canvas)
    }

    /// Fill the canvas white, as an undoable edit.
    pub fn clear(&mut self) {
        let mut edit = SnapshotCommand::new("Clear", &self.canvas);
        self.canvas.fill(WHITE);
        edit.set_after(&self.canvas);
        self.history.push(Box::new(edit));
        self.is_dirty = true;
    }

    /// Start a fresh document: white canvas at the current size, history and
    /// selection discarded, no file path.
    pub fn new_image(&mut self) {
        self.canvas.fill(WHITE);
        self.canvas.selection = None;
        self.gesture = Gesture::Idle;
        self.history.clear();
        self.file_handler.current_path = None;
        self.name = "Untitled".to_string();
        self.is_dirty = false;
    }

    /// Grow the canvas to cover a larger viewport. Marks the document
    /// modified when the buffer actually grows; shrinking the window leaves
    /// the canvas (and any off-screen content) untouched.
    pub fn grow_surface(&mut self, width: f32, height: f32) {
        if self.canvas.grow_to(width.max(0.0) as u32, height.max(0.0) as u32) {
            self.is_dirty = true;
        }
    }

    // ---- file operations ---------------------------------------------------

    /// Show the open dialog and load the chosen image. `Ok(false)` means the
    /// dialog was cancelled (a silent no-op per the dialog contract).
    pub fn open(&mut self) -> Result<bool, FileError> {
        let Some(path) = self.file_handler.pick_open_path() else {
            return Ok(false);
        };
        self.load_from_path(&path)?;
        Ok(true)
    }

    /// Load `path` as the new document content.
    pub fn load_from_path(&mut self, path: &Path) -> Result<(), FileError> {
        let rgba = self.file_handler.load_image(path)?;
        self.canvas.set_image(rgba);
        self.canvas.selection = None;
        self.gesture = Gesture::Idle;
        self.history.clear();
        self.is_dirty = false;
        self.update_name_from_path();
        crate::log_info!("Opened {}", path.display());
        Ok(())
    }

    /// Save to the current path, or fall through to the save dialog for a
    /// never-saved document. `Ok(false)` means the dialog was cancelled.
    pub fn save(&mut self) -> Result<bool, FileError> {
        if self.file_handler.has_current_path() {
            self.file_handler.quick_save(self.canvas.image())?;
            self.is_dirty = false;
            Ok(true)
        } else {
            self.save_as()
        }
    }

    /// Show the save dialog and encode the canvas to the chosen path.
    /// `Ok(false)` means the dialog was cancelled.
    pub fn save_as(&mut self) -> Result<bool, FileError> {
        let Some(path) = self.file_handler.pick_save_path() else {
            return Ok(false);
        };
        self.file_handler.save_image(self.canvas.image(), &path)?;
        self.is_dirty = false;
        self.update_name_from_path();
        crate::log_info!("Saved {}", path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::shapes::ShapeKind;
    use egui::pos2;

    #[test]
    fn arming_a_tool_mutates_nothing() {
        let mut project = Project::new_untitled(16, 16);
        let before = project.canvas.image().clone();
        project.arm_tool(Tool::Shape(ShapeKind::Oval));
        project.arm_tool(Tool::Select);
        assert_eq!(project.canvas.image().as_raw(), before.as_raw());
        assert!(!project.is_dirty);
        assert!(!project.history.can_undo());
    }

    #[test]
    fn release_without_press_is_a_noop() {
        let mut project = Project::new_untitled(16, 16);
        let before = project.canvas.image().clone();
        project.pointer_moved(pos2(5.0, 5.0));
        project.pointer_released(pos2(5.0, 5.0));
        assert_eq!(project.canvas.image().as_raw(), before.as_raw());
        assert!(!project.history.can_undo());
    }

    #[test]
    fn shape_and_select_arming_are_one_shot() {
        let mut project = Project::new_untitled(64, 64);
        project.arm_tool(Tool::Shape(ShapeKind::Line));
        project.pointer_pressed(pos2(2.0, 2.0));
        project.pointer_released(pos2(10.0, 2.0));
        assert_eq!(project.active_tool(), Tool::Freehand);

        project.arm_tool(Tool::Select);
        project.pointer_pressed(pos2(20.0, 20.0));
        project.pointer_moved(pos2(30.0, 30.0));
        project.pointer_released(pos2(30.0, 30.0));
        assert_eq!(project.active_tool(), Tool::Freehand);
    }

    #[test]
    fn overlay_follows_selection_drag_then_floating_rect() {
        let mut project = Project::new_untitled(64, 64);
        assert!(project.overlay_rect().is_none());

        project.arm_tool(Tool::Select);
        project.pointer_pressed(pos2(10.0, 10.0));
        project.pointer_moved(pos2(20.0, 25.0));
        let dragging = project.overlay_rect().unwrap();
        assert_eq!(dragging, Rect::from_two_pos(pos2(10.0, 10.0), pos2(20.0, 25.0)));

        project.pointer_released(pos2(20.0, 25.0));
        let floating = project.overlay_rect().unwrap();
        assert_eq!(floating.min, pos2(10.0, 10.0));
        assert_eq!(floating.size(), egui::vec2(10.0, 15.0));
    }

    #[test]
    fn title_carries_dirty_marker() {
        let mut project = Project::new_untitled(8, 8);
        assert_eq!(project.display_title(), "Untitled");
        project.clear();
        assert_eq!(project.display_title(), "Untitled*");
    }
}
