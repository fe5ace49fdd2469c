use std::sync::Arc;

use eframe::egui::{self, load::Bytes, ScrollArea, Ui};

use super::{panels, plot, tables};
use crate::data::model::Diagnosis;
use crate::report::{
    ClassCounts, BAR_CHART_FILE, INTERACTIVE_CHART_FILE, PIE_CHART_FILE, PREDICTIONS_FILE,
};
use crate::state::AppState;

/// A download requested while drawing; performed once the frame's borrows end.
struct Download {
    file_name: &'static str,
    bytes: Arc<[u8]>,
}

fn png_image(ui: &mut Ui, uri: String, png: &Arc<[u8]>) {
    ui.add(
        egui::Image::from_bytes(uri, Bytes::Shared(png.clone()))
            .max_width(ui.available_width())
            .maintain_aspect_ratio(true),
    );
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the central panel: landing view before an upload, results after.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let mut download = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if state.upload.is_some() {
                download = results_view(ui, state);
            } else {
                landing_view(ui, state);
            }
        });

    if let Some(Download { file_name, bytes }) = download {
        panels::save_file_dialog(state, file_name, &bytes);
    }
}

fn landing_view(ui: &mut Ui, state: &AppState) {
    ui.heading("Dementia-stage prediction and visualisation");
    ui.label("Open a CSV file (File → Open…) to predict a group for every row.");
    ui.separator();

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Example data format");
        cols[0].label("First column: subject identifier; `--` marks a missing value.");
        tables::example_format(&mut cols[0]);

        cols[1].strong("Predicted groups");
        for class in Diagnosis::ALL {
            cols[1].label(format!(
                "{} ({}) – {}",
                class.name(),
                class.code(),
                class.description()
            ));
        }
    });

    ui.separator();
    ui.strong("Example prediction distribution");
    match &state.example_chart {
        Some(png) => png_image(ui, "bytes://example_bar_chart.png".to_string(), png),
        None => plot::class_bar_plot(ui, "example_plot", &ClassCounts::example()),
    }
}

fn results_view(ui: &mut Ui, state: &AppState) -> Option<Download> {
    let upload = state.upload.as_ref()?;
    let report = &upload.report;
    let generation = upload.generation;
    let mut download = None;

    ui.heading("Raw data");
    tables::raw_table(ui, &upload.table.raw);
    ui.separator();

    ui.heading("Prediction results");
    tables::prediction_table(ui, &upload.table);
    if ui.button("⬇ Download predictions").clicked() {
        download = Some(Download {
            file_name: PREDICTIONS_FILE,
            bytes: report.csv.clone(),
        });
    }
    ui.separator();

    ui.heading("Prediction analysis");
    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Distribution (bar chart)");
        png_image(&mut cols[0], format!("bytes://bar_chart_{generation}.png"), &report.bar_png);
        if cols[0].button("⬇ Download bar chart").clicked() {
            download = Some(Download {
                file_name: BAR_CHART_FILE,
                bytes: report.bar_png.clone(),
            });
        }

        cols[1].strong("Proportion (pie chart)");
        png_image(&mut cols[1], format!("bytes://pie_chart_{generation}.png"), &report.pie_png);
        if cols[1].button("⬇ Download pie chart").clicked() {
            download = Some(Download {
                file_name: PIE_CHART_FILE,
                bytes: report.pie_png.clone(),
            });
        }
    });
    ui.separator();

    ui.heading("Interactive bar chart");
    plot::class_bar_plot(ui, "interactive_plot", &report.counts);
    if ui.button("⬇ Download interactive bar chart").clicked() {
        download = Some(Download {
            file_name: INTERACTIVE_CHART_FILE,
            bytes: Arc::from(report.html.as_bytes()),
        });
    }

    download
}
