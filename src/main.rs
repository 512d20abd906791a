// GUI-subsystem binary: no console window is allocated on Windows.
#![windows_subsystem = "windows"]

use eframe::egui;

use easel::EaselApp;
use easel::logger;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("easel"),
        ..Default::default()
    };

    eframe::run_native(
        "easel",
        options,
        Box::new(|cc| Box::new(EaselApp::new(cc))),
    )
}
