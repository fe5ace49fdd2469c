use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::{class_color, to_color32};
use crate::data::model::Diagnosis;
use crate::report::ClassCounts;

// ---------------------------------------------------------------------------
// Interactive class-frequency bar chart
// ---------------------------------------------------------------------------

/// Zoomable bar chart with hover read-out, one bar per class.
pub fn class_bar_plot(ui: &mut Ui, id: &str, counts: &ClassCounts) {
    Plot::new(id)
        .legend(Legend::default())
        .x_axis_label("Predicted Group")
        .y_axis_label("Count")
        .height(300.0)
        .include_x(-0.5)
        .include_x(Diagnosis::ALL.len() as f64 - 0.5)
        .include_y(0.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (i, class) in Diagnosis::ALL.iter().enumerate() {
                let color = to_color32(class_color(*class));
                let bar = Bar::new(i as f64, counts.get(*class) as f64)
                    .width(0.6)
                    .name(class.name())
                    .fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(class.name()).color(color));
            }
        });
}
