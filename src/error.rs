use thiserror::Error;

// ---------------------------------------------------------------------------
// Pipeline error taxonomy
// ---------------------------------------------------------------------------

/// Everything that can go wrong between an upload and a labelled table.
///
/// Every variant is terminal for the current upload: nothing is retried and
/// no partial result is produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One of the three artifacts is missing, unreadable or inconsistent.
    #[error("failed to load {artifact} from {path}: {reason}")]
    ArtifactLoad {
        artifact: &'static str,
        path: String,
        reason: String,
    },

    /// Artifacts failed to load at startup; predictions are disabled.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Uploaded content is not valid delimited text.
    #[error("could not parse upload: {0}")]
    Parse(String),

    /// A feature cell is neither a finite number nor missing. `row` is
    /// 1-based, counting data rows below the header.
    #[error("row {row}, column '{column}': '{value}' is not numeric")]
    TypeMismatch {
        row: usize,
        column: String,
        value: String,
    },

    /// A derived value overflowed, or a classifier produced no usable
    /// probabilities for a row (1-based).
    #[error("row {row}: non-finite value in {stage}")]
    NonFinite { stage: &'static str, row: usize },

    /// Feature columns disagree with what a pipeline stage was fitted on.
    #[error("schema mismatch in {stage}: {detail}")]
    SchemaMismatch { stage: &'static str, detail: String },

    /// The classifier produced a label outside {0, 1, 2}.
    #[error("classifier produced unknown label {0}")]
    InvalidLabel(i64),

    /// Chart or export rendering failed.
    #[error("render error: {0}")]
    Render(String),
}

impl PipelineError {
    pub fn schema(stage: &'static str, detail: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            stage,
            detail: detail.into(),
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Parse(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::schema("matrix", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::TypeMismatch {
            row: 2,
            column: "Feature1".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "row 2, column 'Feature1': 'abc' is not numeric"
        );
    }

    #[test]
    fn test_non_finite_display() {
        let err = PipelineError::NonFinite {
            stage: "features",
            row: 1,
        };
        assert_eq!(err.to_string(), "row 1: non-finite value in features");
    }

    #[test]
    fn test_schema_helper() {
        let err = PipelineError::schema("scaler", "expected 4 columns, got 3");
        assert!(matches!(
            err,
            PipelineError::SchemaMismatch { stage: "scaler", .. }
        ));
    }
}
