#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod run_worker;
mod views;

use app::StochViewApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("StochView"),
        ..Default::default()
    };

    eframe::run_native(
        "StochView",
        options,
        Box::new(|cc| Ok(Box::new(StochViewApp::new(cc)))),
    )
}
