//! Fitted base classifiers and the serialized estimator tree

use std::f64::consts::PI;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::ensemble::{StackingClassifier, VotingClassifier};
use super::{check_width, Classifier};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Estimator – any supported fitted classifier
// ---------------------------------------------------------------------------

/// A fitted classifier as stored in the model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression(LogisticRegression),
    GaussianNb(GaussianNb),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    Voting(VotingClassifier),
    Stacking(StackingClassifier),
}

impl Estimator {
    fn inner(&self) -> &dyn Classifier {
        match self {
            Estimator::LogisticRegression(m) => m,
            Estimator::GaussianNb(m) => m,
            Estimator::DecisionTree(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::Voting(m) => m,
            Estimator::Stacking(m) => m,
        }
    }

    /// Check internal consistency of the fitted parameters.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Estimator::LogisticRegression(m) => m.validate(),
            Estimator::GaussianNb(m) => m.validate(),
            Estimator::DecisionTree(m) => m.validate(),
            Estimator::RandomForest(m) => m.validate(),
            Estimator::Voting(m) => m.validate(),
            Estimator::Stacking(m) => m.validate(),
        }
    }
}

impl Classifier for Estimator {
    fn classes(&self) -> &[i64] {
        self.inner().classes()
    }

    fn n_features_in(&self) -> usize {
        self.inner().n_features_in()
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        self.inner().predict_proba(x)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>, PipelineError> {
        self.inner().predict(x)
    }
}

fn check_classes(classes: &[i64]) -> Result<(), String> {
    if classes.len() < 2 {
        return Err(format!("need at least two classes, got {classes:?}"));
    }
    if classes.windows(2).any(|w| w[0] >= w[1]) {
        return Err(format!("classes must be sorted and unique, got {classes:?}"));
    }
    Ok(())
}

fn check_rows(what: &str, rows: &[Vec<f64>], n_rows: usize, n_cols: usize) -> Result<(), String> {
    if rows.len() != n_rows {
        return Err(format!("{what}: expected {n_rows} rows, got {}", rows.len()));
    }
    if let Some(i) = rows.iter().position(|r| r.len() != n_cols) {
        return Err(format!("{what}: row {i} has {} values, expected {n_cols}", rows[i].len()));
    }
    Ok(())
}

/// Normalise each row of `scores` in place with a numerically stable softmax.
fn softmax_rows(scores: &mut Array2<f64>) {
    for mut row in scores.rows_mut() {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let total: f64 = row.sum();
        row.mapv_inplace(|v| v / total);
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

// ---------------------------------------------------------------------------
// Logistic regression
// ---------------------------------------------------------------------------

/// How multi-class probabilities are formed from the linear scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiClass {
    #[default]
    Multinomial,
    Ovr,
}

/// Linear model: one coefficient row per class (a single row when binary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default)]
    pub multi_class: MultiClass,
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<(), String> {
        check_classes(&self.classes)?;
        let n_rows = if self.classes.len() == 2 { 1 } else { self.classes.len() };
        let n_features = self.coef.first().map_or(0, Vec::len);
        if n_features == 0 {
            return Err("logistic regression has no coefficients".to_string());
        }
        check_rows("coef", &self.coef, n_rows, n_features)?;
        if self.intercept.len() != n_rows {
            return Err(format!(
                "intercept has {} values, expected {n_rows}",
                self.intercept.len()
            ));
        }
        if self.coef.iter().flatten().chain(&self.intercept).any(|v| !v.is_finite()) {
            return Err("coef and intercept must be finite".to_string());
        }
        Ok(())
    }

    fn decision_function(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut scores: Array2<f64> = Array2::zeros((x.nrows(), self.coef.len()));
        for (i, sample) in x.rows().into_iter().enumerate() {
            for (k, (w, b)) in self.coef.iter().zip(&self.intercept).enumerate() {
                scores[[i, k]] = sample.iter().zip(w).map(|(xi, wi)| xi * wi).sum::<f64>() + b;
            }
        }
        scores
    }
}

impl Classifier for LogisticRegression {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features_in(&self) -> usize {
        self.coef.first().map_or(0, Vec::len)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        check_width("logistic_regression", self.n_features_in(), x)?;
        let scores = self.decision_function(x);

        if self.classes.len() == 2 {
            let mut proba: Array2<f64> = Array2::zeros((x.nrows(), 2));
            for i in 0..x.nrows() {
                let p = sigmoid(scores[[i, 0]]);
                proba[[i, 0]] = 1.0 - p;
                proba[[i, 1]] = p;
            }
            return Ok(proba);
        }

        let mut proba = scores;
        match self.multi_class {
            MultiClass::Multinomial => softmax_rows(&mut proba),
            MultiClass::Ovr => {
                proba.mapv_inplace(sigmoid);
                for mut row in proba.rows_mut() {
                    let total: f64 = row.sum();
                    row.mapv_inplace(|v| v / total);
                }
            }
        }
        Ok(proba)
    }
}

// ---------------------------------------------------------------------------
// Gaussian naive Bayes
// ---------------------------------------------------------------------------

/// Per-class feature means (`theta`) and variances (`var`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNb {
    pub classes: Vec<i64>,
    pub theta: Vec<Vec<f64>>,
    pub var: Vec<Vec<f64>>,
    pub class_prior: Vec<f64>,
}

impl GaussianNb {
    pub fn validate(&self) -> Result<(), String> {
        check_classes(&self.classes)?;
        let n_classes = self.classes.len();
        let n_features = self.theta.first().map_or(0, Vec::len);
        if n_features == 0 {
            return Err("naive Bayes has no features".to_string());
        }
        check_rows("theta", &self.theta, n_classes, n_features)?;
        check_rows("var", &self.var, n_classes, n_features)?;
        if self.theta.iter().flatten().any(|v| !v.is_finite()) {
            return Err("theta must be finite".to_string());
        }
        if self.var.iter().flatten().any(|&v| !(v > 0.0 && v.is_finite())) {
            return Err("variances must be positive and finite".to_string());
        }
        if self.class_prior.len() != n_classes
            || self.class_prior.iter().any(|&p| !(p > 0.0 && p.is_finite()))
        {
            return Err("class_prior must hold one positive value per class".to_string());
        }
        Ok(())
    }
}

impl Classifier for GaussianNb {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features_in(&self) -> usize {
        self.theta.first().map_or(0, Vec::len)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        check_width("gaussian_nb", self.n_features_in(), x)?;
        let mut joint: Array2<f64> = Array2::zeros((x.nrows(), self.classes.len()));

        for (i, sample) in x.rows().into_iter().enumerate() {
            for (k, ((means, vars), prior)) in self
                .theta
                .iter()
                .zip(&self.var)
                .zip(&self.class_prior)
                .enumerate()
            {
                let log_likelihood: f64 = sample
                    .iter()
                    .zip(means.iter().zip(vars))
                    .map(|(&xi, (&mean, &var))| {
                        -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
                    })
                    .sum();
                joint[[i, k]] = prior.ln() + log_likelihood;
            }
        }

        softmax_rows(&mut joint);
        Ok(joint)
    }
}

// ---------------------------------------------------------------------------
// Decision tree
// ---------------------------------------------------------------------------

/// Tree node: samples with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Class weights at the leaf (counts or fractions).
    Leaf { value: Vec<f64> },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        match self {
            TreeNode::Leaf { value } => {
                if value.len() != n_classes {
                    return Err(format!(
                        "leaf has {} class weights, expected {n_classes}",
                        value.len()
                    ));
                }
                if value.iter().any(|&v| !(v >= 0.0 && v.is_finite()))
                    || value.iter().sum::<f64>() <= 0.0
                {
                    return Err("leaf weights must be non-negative with a positive sum".to_string());
                }
                Ok(())
            }
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= n_features {
                    return Err(format!(
                        "split on feature {feature}, but tree has {n_features} features"
                    ));
                }
                if threshold.is_nan() {
                    return Err("split threshold is NaN".to_string());
                }
                left.validate(n_features, n_classes)?;
                right.validate(n_features, n_classes)
            }
        }
    }

    fn leaf_for(&self, sample: &[f64]) -> &[f64] {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

/// A single fitted classification tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub classes: Vec<i64>,
    pub n_features_in: usize,
    pub root: TreeNode,
}

impl DecisionTree {
    pub fn validate(&self) -> Result<(), String> {
        check_classes(&self.classes)?;
        if self.n_features_in == 0 {
            return Err("tree has no features".to_string());
        }
        self.root.validate(self.n_features_in, self.classes.len())
    }
}

impl Classifier for DecisionTree {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features_in(&self) -> usize {
        self.n_features_in
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        check_width("decision_tree", self.n_features_in, x)?;
        let mut proba: Array2<f64> = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, sample) in x.rows().into_iter().enumerate() {
            let sample = sample.to_vec();
            let leaf = self.root.leaf_for(&sample);
            let total: f64 = leaf.iter().sum();
            for (k, &w) in leaf.iter().enumerate() {
                proba[[i, k]] = w / total;
            }
        }
        Ok(proba)
    }
}

// ---------------------------------------------------------------------------
// Random forest
// ---------------------------------------------------------------------------

/// Averages the class probabilities of its trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), String> {
        check_classes(&self.classes)?;
        let first = self.trees.first().ok_or("forest has no trees")?;
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
            if tree.classes != self.classes {
                return Err(format!("tree {i} has classes {:?}", tree.classes));
            }
            if tree.n_features_in != first.n_features_in {
                return Err(format!("tree {i} has {} features", tree.n_features_in));
            }
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features_in(&self) -> usize {
        self.trees.first().map_or(0, |t| t.n_features_in)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        check_width("random_forest", self.n_features_in(), x)?;
        let mut proba: Array2<f64> = Array2::zeros((x.nrows(), self.classes.len()));
        for tree in &self.trees {
            proba += &tree.predict_proba(x)?;
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }
}
