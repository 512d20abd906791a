use eframe::egui;
use egui::Color32;

use crate::components::tools::{MAX_PEN_WIDTH, MIN_PEN_WIDTH};

// ============================================================================
// PEN WIDTH DIALOG — bounded integer input
// ============================================================================

/// Modal pen-width picker. `show` returns `Some(width)` only when the user
/// confirms; Cancel (or closing the window) leaves the pen untouched.
pub struct PenWidthDialog {
    pub open: bool,
    width: u32,
}

impl Default for PenWidthDialog {
    fn default() -> Self {
        Self {
            open: false,
            width: MIN_PEN_WIDTH,
        }
    }
}

impl PenWidthDialog {
    /// Open the dialog pre-filled with the current pen width.
    pub fn open_with(&mut self, current: u32) {
        self.width = current.clamp(MIN_PEN_WIDTH, MAX_PEN_WIDTH);
        self.open = true;
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<u32> {
        if !self.open {
            return None;
        }
        let mut confirmed = None;
        let mut keep_open = true;

        egui::Window::new("Pen Width")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Select pen width:");
                ui.add(egui::Slider::new(
                    &mut self.width,
                    MIN_PEN_WIDTH..=MAX_PEN_WIDTH,
                ));
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        confirmed = Some(self.width);
                        keep_open = false;
                    }
                    if ui.button("Cancel").clicked() {
                        keep_open = false;
                    }
                });
            });

        self.open = keep_open;
        confirmed
    }
}

// ============================================================================
// PEN COLOR DIALOG
// ============================================================================

/// Modal pen-color picker. Same confirm/cancel contract as the width dialog.
pub struct PenColorDialog {
    pub open: bool,
    color: Color32,
}

impl Default for PenColorDialog {
    fn default() -> Self {
        Self {
            open: false,
            color: Color32::BLACK,
        }
    }
}

impl PenColorDialog {
    /// Open the dialog pre-filled with the current pen color.
    pub fn open_with(&mut self, current: Color32) {
        self.color = current;
        self.open = true;
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<Color32> {
        if !self.open {
            return None;
        }
        let mut confirmed = None;
        let mut keep_open = true;

        egui::Window::new("Pen Color")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Pen color:");
                    egui::color_picker::color_edit_button_srgba(
                        ui,
                        &mut self.color,
                        egui::color_picker::Alpha::Opaque,
                    );
                });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        confirmed = Some(self.color);
                        keep_open = false;
                    }
                    if ui.button("Cancel").clicked() {
                        keep_open = false;
                    }
                });
            });

        self.open = keep_open;
        confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_with_clamps_seed_width() {
        let mut dialog = PenWidthDialog::default();
        dialog.open_with(200);
        assert!(dialog.open);
        assert_eq!(dialog.width, MAX_PEN_WIDTH);
    }
}
