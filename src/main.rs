mod app;
mod color;
mod data;
mod error;
mod model;
mod pipeline;
mod report;
mod state;
mod ui;

// Compiled into the test build so the demo artifacts are checked against the loader.
#[cfg(test)]
#[allow(dead_code)]
#[path = "bin/generate_sample.rs"]
mod generate_sample;

use app::DashboardApp;
use eframe::egui;
use model::{ArtifactPaths, ModelHandle};

fn main() -> eframe::Result {
    env_logger::init();

    // Loaded once; a failure leaves the dashboard up with predictions disabled.
    let model = ModelHandle::load(&ArtifactPaths::default());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "MLOps – Prediction & Visualisation",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render the chart PNGs.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(model)))
        }),
    )
}
