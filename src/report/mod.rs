//! Presentation layer without the UI: class frequencies and the four
//! downloadable artifacts (CSV, two PNG charts, interactive HTML chart).

pub mod chart;
pub mod export;
pub mod font;
pub mod interactive;

use std::sync::Arc;

use crate::data::model::{Diagnosis, ResultTable};
use crate::error::PipelineError;

pub const PREDICTIONS_FILE: &str = "predictions.csv";
pub const BAR_CHART_FILE: &str = "bar_chart.png";
pub const PIE_CHART_FILE: &str = "pie_chart.png";
pub const INTERACTIVE_CHART_FILE: &str = "interactive_bar_chart.html";

pub const DISTRIBUTION_TITLE: &str = "Prediction Result Distribution";
pub const PROPORTION_TITLE: &str = "Prediction Result Proportion";
pub const EXAMPLE_TITLE: &str = "Example Prediction Distribution";

// ---------------------------------------------------------------------------
// ClassCounts – frequency of each predicted group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    counts: [usize; 3],
}

impl ClassCounts {
    pub fn from_predictions(predictions: &[Diagnosis]) -> Self {
        let mut counts = [0; 3];
        for p in predictions {
            counts[p.code() as usize] += 1;
        }
        Self { counts }
    }

    /// The illustrative distribution shown before any upload.
    pub fn example() -> Self {
        Self { counts: [10, 20, 15] }
    }

    pub fn get(&self, class: Diagnosis) -> usize {
        self.counts[class.code() as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Classes with at least one prediction, in CN, MCI, AD order.
    pub fn present(&self) -> Vec<(Diagnosis, usize)> {
        Diagnosis::ALL
            .iter()
            .map(|&d| (d, self.get(d)))
            .filter(|&(_, n)| n > 0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Report – everything the presenter shows and exports for one upload
// ---------------------------------------------------------------------------

/// Rendered outputs for one labelled table. Byte buffers are shared so the
/// UI can hand them to the image loader every frame without copying.
#[derive(Debug, Clone)]
pub struct Report {
    pub counts: ClassCounts,
    pub csv: Arc<[u8]>,
    pub bar_png: Arc<[u8]>,
    pub pie_png: Arc<[u8]>,
    pub html: Arc<str>,
}

impl Report {
    pub fn build(table: &ResultTable) -> Result<Self, PipelineError> {
        let counts = ClassCounts::from_predictions(&table.predictions);
        Ok(Self {
            counts,
            csv: export::predictions_csv(table)?.into(),
            bar_png: chart::bar_chart_png(&counts, DISTRIBUTION_TITLE)?.into(),
            pie_png: chart::pie_chart_png(&counts, PROPORTION_TITLE)?.into(),
            html: interactive::bar_chart_html(&counts, DISTRIBUTION_TITLE).into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    #[test]
    fn test_counts() {
        let counts = ClassCounts::from_predictions(&[Diagnosis::Ad, Diagnosis::Cn, Diagnosis::Ad]);
        assert_eq!(counts.get(Diagnosis::Ad), 2);
        assert_eq!(counts.get(Diagnosis::Mci), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.max(), 2);
        assert_eq!(
            counts.present(),
            vec![(Diagnosis::Cn, 1), (Diagnosis::Ad, 2)]
        );
    }

    #[test]
    fn test_report_build() {
        let raw = read_csv("ID,A\ns1,1\ns2,2\n".as_bytes()).unwrap();
        let table = ResultTable::new(raw, vec![Diagnosis::Mci, Diagnosis::Mci]).unwrap();
        let report = Report::build(&table).unwrap();
        assert_eq!(report.counts.get(Diagnosis::Mci), 2);
        assert!(report.csv.starts_with(b"ID,A,Predicted_Group\n"));
        assert!(report.bar_png.starts_with(b"\x89PNG"));
        assert!(report.pie_png.starts_with(b"\x89PNG"));
        assert!(report.html.contains("Plotly.newPlot"));
    }
}
