//! Missing value imputation with fitted per-column fill values

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::Transformer;

/// Strategy the fill values were computed with at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Mean,
    Median,
    MostFrequent,
    Constant,
}

/// Fitted imputer: replaces every `NaN` in column `j` with `statistics[j]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    pub strategy: ImputeStrategy,
    pub statistics: Vec<f64>,
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
}

impl SimpleImputer {
    pub fn validate(&self) -> Result<(), String> {
        if self.statistics.is_empty() {
            return Err("imputer has no fill values".to_string());
        }
        if let Some(j) = self.statistics.iter().position(|v| !v.is_finite()) {
            return Err(format!("fill value for column {j} is not finite"));
        }
        if let Some(names) = &self.feature_names_in {
            if names.len() != self.statistics.len() {
                return Err(format!(
                    "{} feature names for {} fill values",
                    names.len(),
                    self.statistics.len()
                ));
            }
        }
        Ok(())
    }
}

impl Transformer for SimpleImputer {
    fn stage(&self) -> &'static str {
        "imputer"
    }

    fn n_features_in(&self) -> usize {
        self.statistics.len()
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    fn transform_values(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for (v, fill) in row.iter_mut().zip(&self.statistics) {
                if v.is_nan() {
                    *v = *fill;
                }
            }
        }
        out
    }
}
