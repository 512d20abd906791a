use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, TextureHandle, TextureOptions};
use image::Rgba;

use crate::components::dialogs::{PenColorDialog, PenWidthDialog};
use crate::components::tools::Tool;
use crate::io::FileError;
use crate::ops::shapes::ShapeKind;
use crate::project::Project;

/// Initial window (and therefore canvas) size.
const INITIAL_SIZE: [f32; 2] = [1280.0, 720.0];

/// The window shell: owns the [`Project`] controller and forwards input,
/// paint, and resize events to it. All toolkit-facing code lives here — the
/// controller never sees egui widgets.
pub struct EaselApp {
    project: Project,

    // Display texture for the canvas buffer, re-uploaded when the canvas
    // dirty generation moves.
    canvas_texture: Option<TextureHandle>,
    texture_generation: u64,

    // Modal dialogs (at most one open at a time in practice)
    pen_width_dialog: PenWidthDialog,
    pen_color_dialog: PenColorDialog,

    /// Last action / error line shown in the status bar.
    status: String,
    /// Last pointer position over the canvas, for releases that land with no
    /// hover position (e.g. outside the window).
    last_canvas_pos: Option<Pos2>,
    last_title: String,
}

impl EaselApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            project: Project::new_untitled(INITIAL_SIZE[0] as u32, INITIAL_SIZE[1] as u32),
            canvas_texture: None,
            texture_generation: 0,
            pen_width_dialog: PenWidthDialog::default(),
            pen_color_dialog: PenColorDialog::default(),
            status: String::new(),
            last_canvas_pos: None,
            last_title: String::new(),
        }
    }

    /// Report the outcome of an open/save: cancelled dialogs stay silent,
    /// successes and failures go to the status bar (failures also to the
    /// session log).
    fn report_file_result(&mut self, verb: &str, done: &str, result: Result<bool, FileError>) {
        match result {
            Ok(true) => self.status = format!("{} {}", done, self.project.name),
            Ok(false) => {}
            Err(e) => {
                self.status = format!("{} failed: {}", verb, e);
                crate::log_err!("{} failed: {}", verb, e);
            }
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.project.new_image();
                        self.status = "New image".to_string();
                        ui.close_menu();
                    }
                    if ui.button("Open…").clicked() {
                        let result = self.project.open();
                        self.report_file_result("Open", "Opened", result);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Save").clicked() {
                        let result = self.project.save();
                        self.report_file_result("Save", "Saved", result);
                        ui.close_menu();
                    }
                    if ui.button("Save As…").clicked() {
                        let result = self.project.save_as();
                        self.report_file_result("Save", "Saved", result);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close_menu();
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui.button("Undo").clicked() {
                        self.undo();
                        ui.close_menu();
                    }
                    if ui.button("Redo").clicked() {
                        self.redo();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Clear").clicked() {
                        self.project.clear();
                        self.status = "Canvas cleared".to_string();
                        ui.close_menu();
                    }
                });

                ui.menu_button("Tools", |ui| {
                    let active = self.project.active_tool();
                    if ui
                        .selectable_label(active == Tool::Freehand, "Freehand")
                        .clicked()
                    {
                        self.project.arm_tool(Tool::Freehand);
                        ui.close_menu();
                    }
                    if ui
                        .selectable_label(active == Tool::Select, "Select")
                        .clicked()
                    {
                        self.project.arm_tool(Tool::Select);
                        ui.close_menu();
                    }
                    ui.separator();
                    for &kind in ShapeKind::all() {
                        if ui
                            .selectable_label(active == Tool::Shape(kind), kind.label())
                            .clicked()
                        {
                            self.project.arm_tool(Tool::Shape(kind));
                            ui.close_menu();
                        }
                    }
                });

                ui.menu_button("Options", |ui| {
                    if ui.button("Pen Color…").clicked() {
                        let c = self.project.pen().color();
                        self.pen_color_dialog
                            .open_with(Color32::from_rgb(c[0], c[1], c[2]));
                        ui.close_menu();
                    }
                    if ui.button("Pen Width…").clicked() {
                        self.pen_width_dialog.open_with(self.project.pen().width());
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!(
                        "{}×{}  |  {} ({} px)",
                        self.project.canvas.width(),
                        self.project.canvas.height(),
                        self.project.active_tool().label(),
                        self.project.pen().width(),
                    ));
                });
            });
        });
    }

    fn show_canvas(&mut self, ctx: &egui::Context, modal_open: bool) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
                let canvas_rect = response.rect;

                // A window larger than the canvas grows the buffer (never
                // shrinks it).
                self.project
                    .grow_surface(canvas_rect.width(), canvas_rect.height());

                // Re-upload the display texture only when the buffer changed.
                if self.canvas_texture.is_none()
                    || self.texture_generation != self.project.canvas.dirty_generation
                {
                    let image = self.project.canvas.image();
                    let color_image = ColorImage::from_rgba_unmultiplied(
                        [image.width() as usize, image.height() as usize],
                        image.as_raw(),
                    );
                    match &mut self.canvas_texture {
                        Some(tex) => tex.set(color_image, TextureOptions::NEAREST),
                        None => {
                            self.canvas_texture = Some(ui.ctx().load_texture(
                                "canvas",
                                color_image,
                                TextureOptions::NEAREST,
                            ))
                        }
                    }
                    self.texture_generation = self.project.canvas.dirty_generation;
                }

                if let Some(tex) = &self.canvas_texture {
                    let size = egui::vec2(tex.size()[0] as f32, tex.size()[1] as f32);
                    let image_rect = Rect::from_min_size(canvas_rect.min, size);
                    let uv = Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0));
                    painter
                        .with_clip_rect(canvas_rect)
                        .image(tex.id(), image_rect, uv, Color32::WHITE);
                }

                if !modal_open {
                    self.forward_pointer_events(ctx, canvas_rect);
                }

                // Dashed overlay for in-progress selection/shape drags and
                // the floating selection.
                if let Some(rect) = self.project.overlay_rect() {
                    let screen = rect.translate(canvas_rect.min.to_vec2());
                    draw_dashed_rect(&painter, screen, Color32::DARK_GRAY);
                }
            });
    }

    /// Translate egui pointer state into the controller's narrow
    /// press/move/release interface.
    fn forward_pointer_events(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let over_widget = ctx.is_pointer_over_area();
        let hover = ctx.input(|i| i.pointer.hover_pos());
        let primary_pressed = ctx.input(|i| i.pointer.primary_pressed());
        let primary_down = ctx.input(|i| i.pointer.primary_down());
        let primary_released = ctx.input(|i| i.pointer.primary_released());

        let canvas_pos = hover.map(|p| p - canvas_rect.min.to_vec2());
        if let Some(pos) = canvas_pos {
            self.last_canvas_pos = Some(pos);
        }

        if primary_pressed && !over_widget {
            if let Some(p) = hover.filter(|p| canvas_rect.contains(*p)) {
                self.project.pointer_pressed(p - canvas_rect.min.to_vec2());
            }
        } else if primary_down && self.project.gesture_active() {
            // Drags may leave the canvas; the controller clips for us.
            if let Some(pos) = canvas_pos {
                self.project.pointer_moved(pos);
            }
        }

        if primary_released && self.project.gesture_active() {
            let pos = canvas_pos
                .or(self.last_canvas_pos)
                .unwrap_or(Pos2::ZERO);
            self.project.pointer_released(pos);
        }
    }

    fn undo(&mut self) {
        if let Some(desc) = self.project.undo() {
            self.status = format!("Undo: {}", desc);
        }
    }

    fn redo(&mut self) {
        if let Some(desc) = self.project.redo() {
            self.status = format!("Redo: {}", desc);
        }
    }
}

impl eframe::App for EaselApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let modal_open = self.pen_width_dialog.open || self.pen_color_dialog.open;

        // Keep the window title in sync with the document name/dirty marker.
        let title = format!("easel — {}", self.project.display_title());
        if title != self.last_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.last_title = title;
        }

        // Escape closes the window; open dialogs swallow it.
        if !modal_open && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // Undo/redo shortcuts are inert while a drag gesture is in flight —
        // the gesture's pending snapshot must stay consistent with the canvas.
        if !self.project.gesture_active() {
            if ctx.input_mut(|i| {
                i.consume_shortcut(&egui::KeyboardShortcut::new(
                    egui::Modifiers::COMMAND,
                    egui::Key::Z,
                ))
            }) {
                self.undo();
            }
            if ctx.input_mut(|i| {
                i.consume_shortcut(&egui::KeyboardShortcut::new(
                    egui::Modifiers::COMMAND,
                    egui::Key::Y,
                ))
            }) {
                self.redo();
            }
        }

        self.show_menu_bar(ctx);
        self.show_status_bar(ctx);
        self.show_canvas(ctx, modal_open);

        if let Some(width) = self.pen_width_dialog.show(ctx) {
            self.project.set_pen_width(width);
            self.status = format!("Pen width set to {} px", width);
        }
        if let Some(color) = self.pen_color_dialog.show(ctx) {
            self.project.set_pen_color(Rgba(color.to_array()));
            self.status = "Pen color updated".to_string();
        }
    }
}

/// Draw a dashed rectangle outline, edge by edge.
fn draw_dashed_rect(painter: &egui::Painter, rect: Rect, color: Color32) {
    let stroke = egui::Stroke::new(1.0, color);
    let corners = [
        (rect.left_top(), rect.right_top()),
        (rect.right_top(), rect.right_bottom()),
        (rect.right_bottom(), rect.left_bottom()),
        (rect.left_bottom(), rect.left_top()),
    ];
    for (a, b) in corners {
        draw_dashed_segment(painter, a, b, stroke);
    }
}

fn draw_dashed_segment(painter: &egui::Painter, a: Pos2, b: Pos2, stroke: egui::Stroke) {
    let dash_len = 6.0_f32;
    let gap_len = 4.0_f32;
    let len = a.distance(b);
    if len <= f32::EPSILON {
        return;
    }
    let dir = (b - a) / len;
    let mut t = 0.0;
    while t < len {
        let end = (t + dash_len).min(len);
        painter.line_segment([a + dir * t, a + dir * end], stroke);
        t = end + gap_len;
    }
}
