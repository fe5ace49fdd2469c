//! Writes a demo upload (`sample_upload.csv`) and a matching set of model
//! artifacts under `model_web/` so the dashboard can be tried end to end.
//! The artifact parameters are hand-set around the generator's group means.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Per-group feature means; each feature has the same mean within a group.
const GROUPS: [(&str, f64); 3] = [("CN", 1.0), ("MCI", 2.0), ("AD", 3.5)];
const SUBJECTS_PER_GROUP: usize = 20;
const NOISE: f64 = 0.4;
const MISSING_RATE: f64 = 0.05;
const FEATURES: [&str; 3] = ["Feature1", "Feature2", "Feature3"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_upload(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).context("creating sample CSV")?;
    let mut header = vec!["ID"];
    header.extend(FEATURES);
    writer.write_record(&header)?;

    let mut rows = 0;
    for (group, mean) in GROUPS {
        for i in 0..SUBJECTS_PER_GROUP {
            let mut record = vec![format!("{group}-{:03}", i + 1)];
            for _ in FEATURES {
                if rng.next_f64() < MISSING_RATE {
                    record.push("--".to_string());
                } else {
                    record.push(format!("{:.2}", rng.gauss(mean, NOISE)));
                }
            }
            writer.write_record(&record)?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

/// Leaf with all weight on class `k`.
fn leaf(k: usize) -> Value {
    let mut value = vec![0.0; 3];
    value[k] = 1.0;
    json!({ "node": "leaf", "value": value })
}

/// Two thresholds on one (scaled) feature: low → CN, middle → MCI, high → AD.
fn three_way_tree(feature: usize, low: f64, high: f64) -> Value {
    json!({
        "classes": [0, 1, 2],
        "n_features_in": 4,
        "root": {
            "node": "split", "feature": feature, "threshold": low,
            "left": leaf(0),
            "right": {
                "node": "split", "feature": feature, "threshold": high,
                "left": leaf(1),
                "right": leaf(2),
            },
        },
    })
}

/// Imputer, scaler and classifier JSON, in that order.
pub(crate) fn artifacts() -> (Value, Value, Value) {
    let names = json!(["Feature1", "Feature2", "Feature3", "sum"]);
    let overall = (1.0 + 2.0 + 3.5) / 3.0;
    let center = json!([overall, overall, overall, 3.0 * overall]);

    let imputer = json!({
        "strategy": "mean",
        "statistics": center,
        "feature_names_in": names,
    });
    let scaler = json!({
        "kind": "standard",
        "mean": center,
        "scale": [1.1, 1.1, 1.1, 3.2],
        "feature_names_in": names,
    });

    // Group means in scaled space, feature columns then `sum`.
    let z = |m: f64| (m - overall) / 1.1;
    let z_sum = |m: f64| (3.0 * m - 3.0 * overall) / 3.2;
    let theta: Vec<Vec<f64>> = GROUPS
        .iter()
        .map(|&(_, m)| vec![z(m), z(m), z(m), z_sum(m)])
        .collect();
    let feature_var = (NOISE / 1.1).powi(2);
    let sum_var = 3.0 * NOISE * NOISE / (3.2 * 3.2);

    let logistic = json!({
        "kind": "logistic_regression",
        "classes": [0, 1, 2],
        "coef": [[0.0, 0.0, 0.0, -3.0], [0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 3.0]],
        "intercept": [0.0, 1.0, 0.0],
    });
    let naive_bayes = json!({
        "kind": "gaussian_nb",
        "classes": [0, 1, 2],
        "theta": theta,
        "var": vec![vec![feature_var, feature_var, feature_var, sum_var]; 3],
        "class_prior": [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
    });
    let forest = json!({
        "kind": "random_forest",
        "classes": [0, 1, 2],
        "trees": [three_way_tree(3, -0.6, 0.55), three_way_tree(0, -0.6, 0.5)],
    });

    // Final estimator sums each class's three stacked probabilities.
    let coef: Vec<Vec<f64>> = (0..3)
        .map(|k| (0..9).map(|j| if j % 3 == k { 4.0 } else { 0.0 }).collect())
        .collect();
    let classifier = json!({
        "kind": "stacking",
        "classes": [0, 1, 2],
        "estimators": [logistic, naive_bayes, forest],
        "final_estimator": {
            "kind": "logistic_regression",
            "classes": [0, 1, 2],
            "coef": coef,
            "intercept": [0.0, 0.0, 0.0],
        },
        "stack_method": "predict_proba",
        "passthrough": false,
    });

    (imputer, scaler, classifier)
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let upload = Path::new("sample_upload.csv");
    let rows = write_upload(upload, &mut rng)?;
    println!("Wrote {rows} subjects to {}", upload.display());

    let dir = Path::new("model_web");
    std::fs::create_dir_all(dir).context("creating model_web/")?;
    let (imputer, scaler, classifier) = artifacts();
    write_json(&dir.join("imputer.json"), &imputer)?;
    write_json(&dir.join("scaler.json"), &scaler)?;
    write_json(&dir.join("stacking_model.json"), &classifier)?;
    println!("Wrote demo artifacts to {}/", dir.display());

    Ok(())
}
