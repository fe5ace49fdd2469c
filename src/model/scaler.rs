//! Feature scaling with fitted per-column parameters

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::Transformer;

/// Fitted parameters, one entry per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerKind {
    /// Standard scaling (z-score normalization): (x - mean) / scale
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// Min-Max scaling: x * scale + min
    MinMax { min: Vec<f64>, scale: Vec<f64> },
    /// Robust scaling: (x - center) / scale, center = median, scale = IQR
    Robust { center: Vec<f64>, scale: Vec<f64> },
    /// Max absolute scaling: x / max_abs
    MaxAbs { max_abs: Vec<f64> },
}

/// Per-column affine map stored as `(x - center) / divisor`.
#[derive(Debug, Clone, Copy)]
struct ColumnParams {
    center: f64,
    divisor: f64,
}

/// Fitted feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    #[serde(flatten)]
    pub kind: ScalerKind,
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
}

impl Scaler {
    pub fn validate(&self) -> Result<(), String> {
        let lengths: Vec<usize> = match &self.kind {
            ScalerKind::Standard { mean, scale } => vec![mean.len(), scale.len()],
            ScalerKind::MinMax { min, scale } => vec![min.len(), scale.len()],
            ScalerKind::Robust { center, scale } => vec![center.len(), scale.len()],
            ScalerKind::MaxAbs { max_abs } => vec![max_abs.len()],
        };
        if lengths[0] == 0 {
            return Err("scaler has no columns".to_string());
        }
        if lengths.iter().any(|&n| n != lengths[0]) {
            return Err(format!("scaler parameter vectors disagree in length: {lengths:?}"));
        }
        if let Some(names) = &self.feature_names_in {
            if names.len() != lengths[0] {
                return Err(format!(
                    "{} feature names for {} columns",
                    names.len(),
                    lengths[0]
                ));
            }
        }
        if self.column_params().iter().any(|p| !p.center.is_finite() || !p.divisor.is_finite()) {
            return Err("scaler parameters must be finite".to_string());
        }
        Ok(())
    }

    fn column_params(&self) -> Vec<ColumnParams> {
        // A zero scale leaves the column centred but unscaled.
        let div = |s: f64| if s == 0.0 { 1.0 } else { s };
        match &self.kind {
            ScalerKind::Standard { mean, scale } | ScalerKind::Robust { center: mean, scale } => mean
                .iter()
                .zip(scale)
                .map(|(&center, &s)| ColumnParams {
                    center,
                    divisor: div(s),
                })
                .collect(),
            // x * s + m  ==  (x - (-m / s)) / (1 / s)
            ScalerKind::MinMax { min, scale } => min
                .iter()
                .zip(scale)
                .map(|(&m, &s)| {
                    let s = div(s);
                    ColumnParams {
                        center: -m / s,
                        divisor: 1.0 / s,
                    }
                })
                .collect(),
            ScalerKind::MaxAbs { max_abs } => max_abs
                .iter()
                .map(|&s| ColumnParams {
                    center: 0.0,
                    divisor: div(s),
                })
                .collect(),
        }
    }
}

impl Transformer for Scaler {
    fn stage(&self) -> &'static str {
        "scaler"
    }

    fn n_features_in(&self) -> usize {
        match &self.kind {
            ScalerKind::Standard { mean, .. } => mean.len(),
            ScalerKind::MinMax { min, .. } => min.len(),
            ScalerKind::Robust { center, .. } => center.len(),
            ScalerKind::MaxAbs { max_abs } => max_abs.len(),
        }
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    fn transform_values(&self, x: &Array2<f64>) -> Array2<f64> {
        let params = self.column_params();
        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for (v, p) in row.iter_mut().zip(&params) {
                *v = (*v - p.center) / p.divisor;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FeatureMatrix;
    use ndarray::array;

    fn matrix(values: Array2<f64>) -> FeatureMatrix {
        FeatureMatrix {
            columns: vec!["a".into(), "sum".into()],
            values,
        }
    }

    #[test]
    fn test_standard_scaler() {
        let scaler: Scaler = serde_json::from_str(
            r#"{"kind":"standard","mean":[1.0,10.0],"scale":[2.0,5.0]}"#,
        )
        .unwrap();
        assert!(scaler.validate().is_ok());
        let out = scaler.transform(&matrix(array![[3.0, 0.0]])).unwrap();
        assert_eq!(out.values, array![[1.0, -2.0]]);
    }

    #[test]
    fn test_minmax_scaler() {
        // Fitted on a in [2, 6]: scale = 1/4, min = -2/4
        let scaler = Scaler {
            kind: ScalerKind::MinMax {
                min: vec![-0.5, 0.0],
                scale: vec![0.25, 1.0],
            },
            feature_names_in: None,
        };
        let out = scaler.transform(&matrix(array![[2.0, 3.0], [6.0, 4.0]])).unwrap();
        assert!((out.values[[0, 0]] - 0.0).abs() < 1e-12);
        assert!((out.values[[1, 0]] - 1.0).abs() < 1e-12);
        assert!((out.values[[1, 1]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scale_is_identity_divisor() {
        let scaler = Scaler {
            kind: ScalerKind::MaxAbs {
                max_abs: vec![0.0, 2.0],
            },
            feature_names_in: None,
        };
        let out = scaler.transform(&matrix(array![[3.0, 3.0]])).unwrap();
        assert_eq!(out.values, array![[3.0, 1.5]]);
    }

    #[test]
    fn test_validate_length_mismatch() {
        let scaler = Scaler {
            kind: ScalerKind::Robust {
                center: vec![0.0, 0.0],
                scale: vec![1.0],
            },
            feature_names_in: None,
        };
        assert!(scaler.validate().is_err());
    }
}
