use std::path::Path;
use std::sync::Arc;

use crate::data::model::ResultTable;
use crate::error::PipelineError;
use crate::model::ModelHandle;
use crate::pipeline;
use crate::report::{chart, ClassCounts, Report, EXAMPLE_TITLE};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One successfully processed upload.
pub struct UploadView {
    /// File name shown in the UI.
    pub file_name: String,
    pub table: ResultTable,
    pub report: Report,
    /// Bumped per upload so image URIs never hit a stale texture.
    pub generation: u64,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Artifacts loaded once at startup.
    pub model: ModelHandle,

    /// Latest successful upload (None until the user opens a file).
    pub upload: Option<UploadView>,

    /// Example distribution chart for the landing view.
    pub example_chart: Option<Arc<[u8]>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    generation: u64,
}

impl AppState {
    pub fn new(model: ModelHandle) -> Self {
        let example_chart = match chart::bar_chart_png(&ClassCounts::example(), EXAMPLE_TITLE) {
            Ok(png) => Some(png.into()),
            Err(e) => {
                log::warn!("Could not render example chart: {e}");
                None
            }
        };
        Self {
            model,
            upload: None,
            example_chart,
            status_message: None,
            generation: 0,
        }
    }

    /// Run the full pipeline on an uploaded file. On failure the previous
    /// result stays on screen and the error goes to the status line.
    pub fn process_upload(&mut self, path: &Path) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match self.run_upload(path) {
            Ok((table, report)) => {
                log::info!(
                    "Predicted {} rows from {file_name} ({} columns): {:?}",
                    table.len(),
                    table.raw.columns.len(),
                    report.counts.present()
                );
                self.generation += 1;
                self.upload = Some(UploadView {
                    file_name,
                    table,
                    report,
                    generation: self.generation,
                });
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to process {file_name}: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    fn run_upload(&self, path: &Path) -> Result<(ResultTable, Report), PipelineError> {
        let table = pipeline::analyze_file(&self.model, path)?;
        let report = Report::build(&table)?;
        Ok((table, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Diagnosis;
    use crate::model::artifacts::tests::demo_store;

    fn write_upload(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("upload.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_successful_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_upload(dir.path(), "ID,Feature1,Feature2,Feature3\ns1,0.5,2.1,1.1\n");
        let mut state = AppState::new(ModelHandle::Ready(demo_store()));
        assert!(state.example_chart.is_some());

        state.process_upload(&path);
        let upload = state.upload.as_ref().unwrap();
        assert_eq!(upload.file_name, "upload.csv");
        assert_eq!(upload.table.predictions, vec![Diagnosis::Cn]);
        assert_eq!(upload.generation, 1);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn test_degraded_mode_reports_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_upload(dir.path(), "ID,Feature1\ns1,1\n");
        let mut state = AppState::new(ModelHandle::Unavailable("no imputer".to_string()));

        state.process_upload(&path);
        assert!(state.upload.is_none());
        let msg = state.status_message.unwrap();
        assert!(msg.contains("model unavailable"), "{msg}");
    }

    #[test]
    fn test_failed_upload_keeps_previous_result() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_upload(dir.path(), "ID,Feature1,Feature2,Feature3\ns1,1,2,3\n");
        let mut state = AppState::new(ModelHandle::Ready(demo_store()));
        state.process_upload(&good);

        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "ID,Feature1,Feature2,Feature3\ns1,1,oops,3\n").unwrap();
        state.process_upload(&bad);

        assert_eq!(state.upload.as_ref().unwrap().generation, 1);
        assert!(state.status_message.unwrap().contains("not numeric"));
    }
}
