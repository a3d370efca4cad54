mod app;
mod color;
mod config;
mod data;
mod fetch;
mod state;
mod ui;

use app::QuakeViewApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::from_args().unwrap_or_else(|e| {
        log::error!("{e:#}; using default configuration");
        AppConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Quakeview – Earthquake Map",
        options,
        Box::new(|_cc| Ok(Box::new(QuakeViewApp::new(config)))),
    )
}
