//! Voting and stacking ensembles over fitted estimators

use ndarray::{concatenate, s, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::classifier::Estimator;
use super::{check_width, Classifier};
use crate::error::PipelineError;

fn check_members(classes: &[i64], members: &[Estimator]) -> Result<usize, String> {
    let first = members.first().ok_or("ensemble has no estimators")?;
    let n_features = first.n_features_in();
    for (i, est) in members.iter().enumerate() {
        est.validate().map_err(|e| format!("estimator {i}: {e}"))?;
        if est.classes() != classes {
            return Err(format!(
                "estimator {i} has classes {:?}, ensemble has {classes:?}",
                est.classes()
            ));
        }
        if est.n_features_in() != n_features {
            return Err(format!(
                "estimator {i} expects {} features, estimator 0 expects {n_features}",
                est.n_features_in()
            ));
        }
    }
    Ok(n_features)
}

// ---------------------------------------------------------------------------
// Voting
// ---------------------------------------------------------------------------

/// Voting strategy for classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStrategy {
    /// Hard voting: weighted majority of predicted labels
    #[default]
    Hard,
    /// Soft voting: weighted average of probabilities
    Soft,
}

/// Voting classifier ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingClassifier {
    pub classes: Vec<i64>,
    pub estimators: Vec<Estimator>,
    #[serde(default)]
    pub voting: VotingStrategy,
    /// Per-estimator weights; uniform when absent.
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl VotingClassifier {
    pub fn validate(&self) -> Result<(), String> {
        check_members(&self.classes, &self.estimators)?;
        if let Some(w) = &self.weights {
            if w.len() != self.estimators.len() {
                return Err(format!(
                    "{} weights for {} estimators",
                    w.len(),
                    self.estimators.len()
                ));
            }
            if w.iter().any(|&v| v < 0.0 || !v.is_finite()) || w.iter().sum::<f64>() <= 0.0 {
                return Err("weights must be finite, non-negative and not all zero".to_string());
            }
        }
        Ok(())
    }

    fn weights(&self) -> Vec<f64> {
        let raw = self
            .weights
            .clone()
            .unwrap_or_else(|| vec![1.0; self.estimators.len()]);
        let total: f64 = raw.iter().sum();
        raw.iter().map(|w| w / total).collect()
    }
}

impl Classifier for VotingClassifier {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features_in(&self) -> usize {
        self.estimators.first().map_or(0, |e| e.n_features_in())
    }

    /// Soft voting averages member probabilities; hard voting returns each
    /// class's weighted share of the votes.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        check_width("voting", self.n_features_in(), x)?;
        let weights = self.weights();
        let mut proba: Array2<f64> = Array2::zeros((x.nrows(), self.classes.len()));

        match self.voting {
            VotingStrategy::Soft => {
                for (est, &w) in self.estimators.iter().zip(&weights) {
                    proba.scaled_add(w, &est.predict_proba(x)?);
                }
            }
            VotingStrategy::Hard => {
                for (est, &w) in self.estimators.iter().zip(&weights) {
                    for (i, label) in est.predict(x)?.into_iter().enumerate() {
                        let k = self
                            .classes
                            .iter()
                            .position(|&c| c == label)
                            .ok_or(PipelineError::InvalidLabel(label))?;
                        proba[[i, k]] += w;
                    }
                }
            }
        }
        Ok(proba)
    }
}

// ---------------------------------------------------------------------------
// Stacking
// ---------------------------------------------------------------------------

/// What each base estimator contributes to the meta-features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackMethod {
    /// Class probabilities (positive class only for binary problems)
    #[default]
    PredictProba,
    /// Predicted class index
    Predict,
}

/// Stacking classifier: base estimators feed a final estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackingClassifier {
    pub classes: Vec<i64>,
    pub estimators: Vec<Estimator>,
    pub final_estimator: Box<Estimator>,
    #[serde(default)]
    pub stack_method: StackMethod,
    /// Append the original features to the meta-features.
    #[serde(default)]
    pub passthrough: bool,
}

impl StackingClassifier {
    pub fn validate(&self) -> Result<(), String> {
        let n_features = check_members(&self.classes, &self.estimators)?;
        self.final_estimator
            .validate()
            .map_err(|e| format!("final estimator: {e}"))?;
        if self.final_estimator.classes() != self.classes.as_slice() {
            return Err(format!(
                "final estimator has classes {:?}, ensemble has {:?}",
                self.final_estimator.classes(),
                self.classes
            ));
        }
        let expected = self.meta_width(n_features);
        if self.final_estimator.n_features_in() != expected {
            return Err(format!(
                "final estimator expects {} meta-features, stacking produces {expected}",
                self.final_estimator.n_features_in()
            ));
        }
        Ok(())
    }

    fn columns_per_estimator(&self) -> usize {
        match self.stack_method {
            StackMethod::Predict => 1,
            StackMethod::PredictProba if self.classes.len() == 2 => 1,
            StackMethod::PredictProba => self.classes.len(),
        }
    }

    fn meta_width(&self, n_features: usize) -> usize {
        let base = self.estimators.len() * self.columns_per_estimator();
        if self.passthrough {
            base + n_features
        } else {
            base
        }
    }

    /// Build the final estimator's input from the base estimators' outputs.
    fn meta_features(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        let mut blocks: Vec<Array2<f64>> = Vec::with_capacity(self.estimators.len() + 1);

        for est in &self.estimators {
            let block = match self.stack_method {
                StackMethod::PredictProba => {
                    let proba = est.predict_proba(x)?;
                    if self.classes.len() == 2 {
                        proba.slice(s![.., 1..]).to_owned()
                    } else {
                        proba
                    }
                }
                StackMethod::Predict => {
                    let labels = est.predict(x)?;
                    let indices = labels
                        .into_iter()
                        .map(|label| {
                            self.classes
                                .iter()
                                .position(|&c| c == label)
                                .map(|k| k as f64)
                                .ok_or(PipelineError::InvalidLabel(label))
                        })
                        .collect::<Result<Vec<f64>, _>>()?;
                    Array2::from_shape_vec((x.nrows(), 1), indices)?
                }
            };
            blocks.push(block);
        }
        if self.passthrough {
            blocks.push(x.clone());
        }

        let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
        Ok(concatenate(Axis(1), &views)?)
    }
}

impl Classifier for StackingClassifier {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features_in(&self) -> usize {
        self.estimators.first().map_or(0, |e| e.n_features_in())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        check_width("stacking", self.n_features_in(), x)?;
        let meta = self.meta_features(x)?;
        self.final_estimator.predict_proba(&meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::{DecisionTree, LogisticRegression, MultiClass, TreeNode};
    use ndarray::array;

    /// Tree on one feature: x <= t → class `lo`, otherwise class `hi`.
    fn threshold_tree(t: f64, lo: usize, hi: usize) -> Estimator {
        let leaf = |k: usize| {
            let mut value = vec![0.0; 3];
            value[k] = 1.0;
            Box::new(TreeNode::Leaf { value })
        };
        Estimator::DecisionTree(DecisionTree {
            classes: vec![0, 1, 2],
            n_features_in: 1,
            root: TreeNode::Split {
                feature: 0,
                threshold: t,
                left: leaf(lo),
                right: leaf(hi),
            },
        })
    }

    #[test]
    fn test_hard_voting_majority() {
        let voting = VotingClassifier {
            classes: vec![0, 1, 2],
            estimators: vec![
                threshold_tree(0.0, 0, 2),
                threshold_tree(1.0, 0, 2),
                threshold_tree(2.0, 1, 2),
            ],
            voting: VotingStrategy::Hard,
            weights: None,
        };
        assert!(voting.validate().is_ok());
        // x = 0.5 → votes 2, 0, 1: three-way tie, lowest class wins
        // x = 1.5 → votes 2, 2, 1
        assert_eq!(voting.predict(&array![[0.5], [1.5]]).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_weighted_hard_voting() {
        let voting = VotingClassifier {
            classes: vec![0, 1, 2],
            estimators: vec![threshold_tree(0.0, 0, 2), threshold_tree(1.0, 1, 2)],
            voting: VotingStrategy::Hard,
            weights: Some(vec![1.0, 3.0]),
        };
        assert_eq!(voting.predict(&array![[0.5]]).unwrap(), vec![1]);
    }

    #[test]
    fn test_soft_voting_averages() {
        let voting = VotingClassifier {
            classes: vec![0, 1, 2],
            estimators: vec![threshold_tree(0.0, 0, 2), threshold_tree(1.0, 1, 2)],
            voting: VotingStrategy::Soft,
            weights: None,
        };
        let proba = voting.predict_proba(&array![[0.5]]).unwrap();
        assert_eq!(proba.row(0).to_vec(), vec![0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_voting_rejects_class_mismatch() {
        let mut other = threshold_tree(0.0, 0, 1);
        if let Estimator::DecisionTree(t) = &mut other {
            t.classes = vec![0, 1, 3];
        }
        let voting = VotingClassifier {
            classes: vec![0, 1, 2],
            estimators: vec![threshold_tree(0.0, 0, 2), other],
            voting: VotingStrategy::Hard,
            weights: None,
        };
        assert!(voting.validate().is_err());
    }

    fn identity_final(n_meta: usize) -> Estimator {
        // Picks the class whose stacked probability column is largest,
        // averaging the columns contributed by each base estimator.
        let mut coef = vec![vec![0.0; n_meta]; 3];
        for (j, row) in coef.iter_mut().enumerate() {
            let mut col = j;
            while col < n_meta {
                row[col] = 10.0;
                col += 3;
            }
        }
        Estimator::LogisticRegression(LogisticRegression {
            classes: vec![0, 1, 2],
            coef,
            intercept: vec![0.0; 3],
            multi_class: MultiClass::Multinomial,
        })
    }

    #[test]
    fn test_stacking_proba_meta_features() {
        let stacking = StackingClassifier {
            classes: vec![0, 1, 2],
            estimators: vec![threshold_tree(0.0, 0, 2), threshold_tree(1.0, 1, 2)],
            final_estimator: Box::new(identity_final(6)),
            stack_method: StackMethod::PredictProba,
            passthrough: false,
        };
        assert!(stacking.validate().is_ok());
        let meta = stacking.meta_features(&array![[0.5]]).unwrap();
        assert_eq!(meta.row(0).to_vec(), vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(stacking.predict(&array![[-1.0], [3.0]]).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_stacking_passthrough_width() {
        let stacking = StackingClassifier {
            classes: vec![0, 1, 2],
            estimators: vec![threshold_tree(0.0, 0, 2)],
            final_estimator: Box::new(identity_final(3)),
            stack_method: StackMethod::Predict,
            passthrough: true,
        };
        // Predict contributes one column, passthrough one more: width 2, not 3.
        assert!(stacking.validate().is_err());
        let meta = stacking.meta_features(&array![[4.0]]).unwrap();
        assert_eq!(meta.row(0).to_vec(), vec![2.0, 4.0]);
    }
}
