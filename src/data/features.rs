use ndarray::Array2;

use super::model::{Cell, FeatureMatrix, RawTable, SUM_COLUMN};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Feature construction
// ---------------------------------------------------------------------------

/// Derive the model input from an uploaded table.
///
/// Drops the identifier column, parses every remaining cell as `f64`
/// (missing cells become `NaN`) and appends a `sum` column holding the
/// row-wise sum of the present values. A row with nothing present sums to 0.
/// Infinite cells and a `sum` that overflows are rejected; error rows are
/// 1-based.
pub fn build_features(table: &RawTable) -> Result<FeatureMatrix, PipelineError> {
    let feature_names = table.feature_columns();
    if feature_names.is_empty() {
        return Err(PipelineError::schema(
            "features",
            "upload has no feature columns after the identifier",
        ));
    }
    if feature_names.iter().any(|c| c == SUM_COLUMN) {
        return Err(PipelineError::schema(
            "features",
            format!("upload already has a '{SUM_COLUMN}' column"),
        ));
    }

    let n_features = feature_names.len();
    let n_cols = n_features + 1;
    let mut values = Vec::with_capacity(table.len() * n_cols);

    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 1;
        let mut row_sum = 0.0;
        for (cell, column) in row[1..].iter().zip(feature_names) {
            let v = parse_numeric(cell, row_no, column)?;
            if !v.is_nan() {
                row_sum += v;
            }
            values.push(v);
        }
        if !row_sum.is_finite() {
            return Err(PipelineError::NonFinite {
                stage: "features",
                row: row_no,
            });
        }
        values.push(row_sum);
    }

    let mut columns = feature_names.to_vec();
    columns.push(SUM_COLUMN.to_string());

    Ok(FeatureMatrix {
        columns,
        values: Array2::from_shape_vec((table.len(), n_cols), values)?,
    })
}

fn parse_numeric(cell: &Cell, row: usize, column: &str) -> Result<f64, PipelineError> {
    match cell {
        Cell::Missing => Ok(f64::NAN),
        Cell::Text(s) => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PipelineError::TypeMismatch {
                row,
                column: column.to_string(),
                value: s.clone(),
            }),
    }
}
