use ink_calc::calc::HttpRecognizer;
use ink_calc::gui::CalcApp;
use ink_calc::logging;
use ink_calc::settings::{Settings, SETTINGS_FILE};

use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(SETTINGS_FILE)?;
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));
    tracing::info!(endpoint = %settings.endpoint, "starting");

    let recognizer = Arc::new(HttpRecognizer::new(
        settings.endpoint.clone(),
        settings.request_timeout(),
    )?);

    let (width, height) = settings.window_size;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ink Calc",
        native_options,
        Box::new(move |cc| Box::new(CalcApp::new(cc, settings, recognizer))),
    )
    .map_err(|e| anyhow::anyhow!("run ui: {e}"))
}
