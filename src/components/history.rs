use std::collections::VecDeque;

use image::RgbaImage;

use crate::canvas::CanvasState;

// ============================================================================
// COMMAND TRAIT
// ============================================================================

/// Trait for undoable/redoable commands.
pub trait Command: Send + Sync {
    fn undo(&self, canvas: &mut CanvasState);
    fn redo(&self, canvas: &mut CanvasState);
    fn description(&self) -> String;
    fn memory_size(&self) -> usize;
}

// ============================================================================
// SNAPSHOT COMMAND — whole-buffer undo
// ============================================================================

/// A full copy of the canvas buffer, captured before and after a mutation.
#[derive(Clone)]
pub struct CanvasSnapshot {
    pixels: RgbaImage,
}

impl CanvasSnapshot {
    pub fn capture(canvas: &CanvasState) -> Self {
        Self {
            pixels: canvas.image().clone(),
        }
    }

    pub fn restore_into(&self, canvas: &mut CanvasState) {
        canvas.set_image(self.pixels.clone());
    }

    fn memory_bytes(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

/// Stores complete canvas snapshots around a mutating gesture. Created with
/// the pre-mutation state *before* any pixels change; `set_after` is called
/// once the mutation is complete, just before the command is pushed.
pub struct SnapshotCommand {
    description: String,
    before: CanvasSnapshot,
    after: Option<CanvasSnapshot>,
}

impl SnapshotCommand {
    pub fn new(description: impl Into<String>, canvas: &CanvasState) -> Self {
        Self {
            description: description.into(),
            before: CanvasSnapshot::capture(canvas),
            after: None,
        }
    }

    /// Capture the "after" state. Call this once the operation completes.
    pub fn set_after(&mut self, canvas: &CanvasState) {
        self.after = Some(CanvasSnapshot::capture(canvas));
    }
}

impl Command for SnapshotCommand {
    fn undo(&self, canvas: &mut CanvasState) {
        self.before.restore_into(canvas);
    }

    fn redo(&self, canvas: &mut CanvasState) {
        if let Some(ref after) = self.after {
            after.restore_into(canvas);
        } else {
            // Should not happen — set_after is always called before push.
            crate::log_warn!("SnapshotCommand: no after state for redo, re-applying before state");
            self.before.restore_into(canvas);
        }
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn memory_size(&self) -> usize {
        self.before.memory_bytes() + self.after.as_ref().map_or(0, |a| a.memory_bytes())
    }
}

// ============================================================================
// HISTORY MANAGER — undo/redo stacks with depth and memory limits
// ============================================================================

pub struct HistoryManager {
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: VecDeque<Box<dyn Command>>,
    max_history_size: usize,
    /// Optional memory cap in bytes.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(50)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size,
            max_memory_bytes: Some(100 * 1024 * 1024), // 100 MB default limit
            total_memory: 0,
        }
    }

    /// Record a completed command. Performing a new action discards any
    /// undone states — history stays linear.
    pub fn push(&mut self, command: Box<dyn Command>) {
        for cmd in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(cmd.memory_size());
        }

        self.total_memory += command.memory_size();
        self.undo_stack.push_back(command);

        self.prune();
    }

    /// Undo the most recent command. Returns its description, or `None`
    /// (silently) when there is nothing to undo.
    pub fn undo(&mut self, canvas: &mut CanvasState) -> Option<String> {
        let command = self.undo_stack.pop_back()?;
        let description = command.description();
        command.undo(canvas);
        self.redo_stack.push_back(command);
        Some(description)
    }

    /// Redo the most recently undone command. `None` when the redo stack is
    /// empty.
    pub fn redo(&mut self, canvas: &mut CanvasState) -> Option<String> {
        let command = self.redo_stack.pop_back()?;
        let description = command.description();
        command.redo(canvas);
        self.undo_stack.push_back(command);
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Current memory usage of both stacks (O(1) via cached total).
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    /// Drop oldest entries to stay within the depth and memory limits.
    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                if let Some(removed) = self.undo_stack.pop_front() {
                    self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                }
            }
        }
    }
}
