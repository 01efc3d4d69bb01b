//! Giffy - Video to GIF Converter
//!
//! Main entry point for the application.

mod app;
mod converter;
mod dialogs;

use app::GiffyApp;

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Starting Giffy v{}", env!("CARGO_PKG_VERSION"));

    // Configure native options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([700.0, 600.0])
            .with_min_inner_size([600.0, 500.0])
            .with_title("Giffy - Video to GIF Converter"),
        vsync: true,
        ..Default::default()
    };

    // Run the app
    eframe::run_native(
        "Giffy",
        native_options,
        Box::new(|cc| Box::new(GiffyApp::new(cc))),
    )
}
