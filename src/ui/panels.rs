use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, Ui};

use crate::color::{class_color, to_color32};
use crate::data::model::Diagnosis;
use crate::model::ModelHandle;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – model status and upload
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Model");
    ui.separator();

    match &state.model {
        ModelHandle::Ready(store) => {
            ui.label(RichText::new("✔ Model loaded").color(Color32::DARK_GREEN));
            ui.label(format!("{} input columns", store.n_features_in()));
        }
        ModelHandle::Unavailable(reason) => {
            ui.label(RichText::new("✖ Model unavailable").color(Color32::RED).strong());
            ui.label(RichText::new(reason).small());
        }
    }

    ui.add_space(12.0);
    ui.heading("Upload");
    ui.separator();

    if ui.button("Open CSV…").clicked() {
        open_file_dialog(state);
    }
    if let Some(upload) = &state.upload {
        ui.label(format!("Current file: {}", upload.file_name));
    }

    ui.add_space(12.0);
    ui.heading("Classes");
    ui.separator();
    for class in Diagnosis::ALL {
        ui.label(
            RichText::new(format!("{} ({}) – {}", class.name(), class.code(), class.description()))
                .color(to_color32(class_color(class))),
        );
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.model.is_ready() {
            ui.label(RichText::new("Predictions disabled").color(Color32::RED));
            ui.separator();
        }

        if let Some(upload) = &state.upload {
            ui.label(format!(
                "{}: {} rows predicted",
                upload.file_name,
                upload.table.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open dataset for prediction")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.process_upload(&path);
    }
}

/// Ask where to save `bytes`, suggesting `file_name`, and write them there.
pub fn save_file_dialog(state: &mut AppState, file_name: &str, bytes: &[u8]) {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();

    let Some(path) = rfd::FileDialog::new()
        .set_title("Save")
        .set_file_name(file_name)
        .add_filter(ext.to_ascii_uppercase(), &[ext.as_str()])
        .save_file()
    else {
        return;
    };

    match write_export(&path, bytes) {
        Ok(()) => {
            log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to save export: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
