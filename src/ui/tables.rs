use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::{class_color, to_color32};
use crate::data::model::{Cell, RawTable, ResultTable, PREDICTION_COLUMN};

const ROW_HEIGHT: f32 = 18.0;
const MAX_HEIGHT: f32 = 320.0;

/// Scrollable, striped table over `n_rows` rows; `cell(row, col)` draws a cell.
fn grid_table(
    ui: &mut Ui,
    id: &str,
    columns: &[String],
    n_rows: usize,
    mut cell: impl FnMut(&mut Ui, usize, usize),
) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(MAX_HEIGHT)
            .columns(Column::auto().at_least(70.0), columns.len())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for name in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, n_rows, |mut row| {
                    let i = row.index();
                    for j in 0..columns.len() {
                        row.col(|ui: &mut Ui| cell(ui, i, j));
                    }
                });
            });
    });
}

/// The upload as parsed; missing cells are greyed out.
pub fn raw_table(ui: &mut Ui, table: &RawTable) {
    grid_table(ui, "raw_table", &table.columns, table.len(), |ui, i, j| {
        match &table.rows[i][j] {
            Cell::Missing => {
                ui.weak("NaN");
            }
            Cell::Text(s) => {
                ui.label(s.as_str());
            }
        }
    });
}

/// Identifier, numeric prediction and class name per row.
pub fn prediction_table(ui: &mut Ui, table: &ResultTable) {
    let columns = vec![
        table.raw.columns[0].clone(),
        PREDICTION_COLUMN.to_string(),
        "Group".to_string(),
    ];
    grid_table(ui, "prediction_table", &columns, table.len(), |ui, i, j| {
        let class = table.predictions[i];
        match j {
            0 => {
                ui.label(table.raw.rows[i][0].to_string());
            }
            1 => {
                ui.label(class.code().to_string());
            }
            _ => {
                ui.colored_label(to_color32(class_color(class)), class.name());
            }
        }
    });
}

/// The static example of the expected upload layout.
pub fn example_format(ui: &mut Ui) {
    let rows = [[0.5, 2.1, 1.1], [1.2, 0.8, 3.0], [3.3, 4.5, 2.8]];
    egui::Grid::new("example_format")
        .striped(true)
        .num_columns(3)
        .show(ui, |ui: &mut Ui| {
            for name in ["Feature1", "Feature2", "Feature3"] {
                ui.strong(name);
            }
            ui.end_row();
            for row in rows {
                for v in row {
                    ui.label(format!("{v:.1}"));
                }
                ui.end_row();
            }
        });
}
