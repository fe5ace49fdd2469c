//! Pre-fitted model artifacts and the contracts the pipeline calls them through.
//!
//! ```text
//!  imputer.json ─┐
//!  scaler.json  ─┼─▶ ArtifactStore (validated, immutable) ─▶ ModelHandle
//!  stacking_model.json ┘
//! ```

pub mod artifacts;
pub mod classifier;
pub mod ensemble;
pub mod imputer;
pub mod scaler;

use ndarray::{Array2, Axis};

use crate::data::model::FeatureMatrix;
use crate::error::PipelineError;

pub use artifacts::{ArtifactPaths, ArtifactStore, ModelHandle};

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// A fitted, shape-preserving column transform (imputer, scaler).
pub trait Transformer {
    /// Stage name used in error messages.
    fn stage(&self) -> &'static str;

    /// Number of columns the transform was fitted on.
    fn n_features_in(&self) -> usize;

    /// Column names seen at fit time, when recorded.
    fn feature_names_in(&self) -> Option<&[String]>;

    /// Transform a matrix that already passed [`check_input`].
    fn transform_values(&self, x: &Array2<f64>) -> Array2<f64>;

    /// Validate the input schema, then transform.
    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix, PipelineError> {
        check_input(self.stage(), self.n_features_in(), self.feature_names_in(), x)?;
        Ok(FeatureMatrix {
            columns: x.columns.clone(),
            values: self.transform_values(&x.values),
        })
    }
}

/// A fitted classifier over a numeric matrix.
pub trait Classifier {
    /// Class labels in the column order of [`Classifier::predict_proba`].
    fn classes(&self) -> &[i64];

    fn n_features_in(&self) -> usize;

    /// One row per sample, one column per class.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError>;

    /// Most probable class per row; ties go to the earlier class. A row
    /// with a non-finite probability fails the whole call.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>, PipelineError> {
        let proba = self.predict_proba(x)?;
        let classes = self.classes();
        proba
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(i, row)| {
                if row.iter().any(|p| !p.is_finite()) {
                    return Err(PipelineError::NonFinite {
                        stage: "classifier",
                        row: i + 1,
                    });
                }
                Ok(classes[argmax(row.iter().copied())])
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Check column count (and names, when the artifact recorded them).
pub fn check_input(
    stage: &'static str,
    expected: usize,
    names: Option<&[String]>,
    x: &FeatureMatrix,
) -> Result<(), PipelineError> {
    if x.ncols() != expected {
        return Err(PipelineError::schema(
            stage,
            format!("fitted on {expected} columns, got {}", x.ncols()),
        ));
    }
    if let Some(names) = names {
        if names != x.columns.as_slice() {
            return Err(PipelineError::schema(
                stage,
                format!("fitted on columns {names:?}, got {:?}", x.columns),
            ));
        }
    }
    Ok(())
}

/// Reject a classifier input with the wrong width.
pub fn check_width(stage: &'static str, expected: usize, x: &Array2<f64>) -> Result<(), PipelineError> {
    if x.ncols() != expected {
        return Err(PipelineError::schema(
            stage,
            format!("fitted on {expected} features, got {}", x.ncols()),
        ));
    }
    Ok(())
}

/// Index of the first maximum; 0 for an empty iterator.
pub fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best = i;
            best_val = v;
        }
    }
    best
}
