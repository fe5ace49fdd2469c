use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::classifier::Estimator;
use super::imputer::SimpleImputer;
use super::scaler::Scaler;
use super::{Classifier, Transformer};
use crate::data::model::Diagnosis;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Artifact locations
// ---------------------------------------------------------------------------

/// Where the three fitted artifacts live, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub imputer: PathBuf,
    pub scaler: PathBuf,
    pub classifier: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(Path::new("model_web"))
    }
}

impl ArtifactPaths {
    /// The standard file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            imputer: dir.join("imputer.json"),
            scaler: dir.join("scaler.json"),
            classifier: dir.join("stacking_model.json"),
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactStore – validated, immutable model state
// ---------------------------------------------------------------------------

/// The fitted imputer, scaler and classifier, checked for a common input width.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    imputer: SimpleImputer,
    scaler: Scaler,
    classifier: Estimator,
}

impl ArtifactStore {
    /// Assemble a store from already deserialised artifacts.
    pub fn new(
        imputer: SimpleImputer,
        scaler: Scaler,
        classifier: Estimator,
    ) -> Result<Self, PipelineError> {
        let invalid = |artifact: &'static str, reason: String| PipelineError::ArtifactLoad {
            artifact,
            path: "<memory>".to_string(),
            reason,
        };

        imputer.validate().map_err(|e| invalid("imputer", e))?;
        scaler.validate().map_err(|e| invalid("scaler", e))?;
        classifier.validate().map_err(|e| invalid("classifier", e))?;

        if let Some(label) = classifier
            .classes()
            .iter()
            .find(|&&c| Diagnosis::try_from(c).is_err())
        {
            return Err(invalid(
                "classifier",
                format!("class label {label} is outside {{0, 1, 2}}"),
            ));
        }

        let widths = [
            imputer.n_features_in(),
            scaler.n_features_in(),
            classifier.n_features_in(),
        ];
        if widths.iter().any(|&w| w != widths[0]) {
            return Err(invalid(
                "classifier",
                format!("imputer/scaler/classifier widths disagree: {widths:?}"),
            ));
        }
        if let (Some(a), Some(b)) = (imputer.feature_names_in(), scaler.feature_names_in()) {
            if a != b {
                return Err(invalid(
                    "scaler",
                    format!("feature names {b:?} differ from imputer's {a:?}"),
                ));
            }
        }

        Ok(Self {
            imputer,
            scaler,
            classifier,
        })
    }

    /// Read, deserialise and validate all three artifacts.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, PipelineError> {
        let imputer: SimpleImputer = read_artifact("imputer", &paths.imputer)?;
        let scaler: Scaler = read_artifact("scaler", &paths.scaler)?;
        let classifier: Estimator = read_artifact("classifier", &paths.classifier)?;

        // Re-attribute validation failures to the file they came from.
        Self::new(imputer, scaler, classifier).map_err(|e| match e {
            PipelineError::ArtifactLoad {
                artifact, reason, ..
            } => {
                let path = match artifact {
                    "imputer" => &paths.imputer,
                    "scaler" => &paths.scaler,
                    _ => &paths.classifier,
                };
                PipelineError::ArtifactLoad {
                    artifact,
                    path: path.display().to_string(),
                    reason,
                }
            }
            other => other,
        })
    }

    pub fn imputer(&self) -> &SimpleImputer {
        &self.imputer
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &Estimator {
        &self.classifier
    }

    /// Number of columns (features plus `sum`) the pipeline expects.
    pub fn n_features_in(&self) -> usize {
        self.imputer.n_features_in()
    }
}

fn read_artifact<T: DeserializeOwned>(artifact: &'static str, path: &Path) -> Result<T, PipelineError> {
    let fail = |reason: String| PipelineError::ArtifactLoad {
        artifact,
        path: path.display().to_string(),
        reason,
    };
    let file = File::open(path).map_err(|e| fail(e.to_string()))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| fail(e.to_string()))
}

// ---------------------------------------------------------------------------
// ModelHandle – what the rest of the process holds
// ---------------------------------------------------------------------------

/// Outcome of the one-time artifact load. A failed load leaves the process
/// running with predictions disabled.
#[derive(Debug)]
pub enum ModelHandle {
    Ready(ArtifactStore),
    Unavailable(String),
}

impl ModelHandle {
    /// Load the artifacts, logging the outcome for the operator.
    pub fn load(paths: &ArtifactPaths) -> Self {
        match ArtifactStore::load(paths) {
            Ok(store) => {
                log::info!(
                    "Loaded model artifacts: {} input columns, classes {:?}",
                    store.n_features_in(),
                    store.classifier().classes()
                );
                ModelHandle::Ready(store)
            }
            Err(e) => {
                log::error!("Model artifacts unavailable: {e}");
                ModelHandle::Unavailable(e.to_string())
            }
        }
    }

    /// The store, or `ModelUnavailable` when loading failed.
    pub fn store(&self) -> Result<&ArtifactStore, PipelineError> {
        match self {
            ModelHandle::Ready(store) => Ok(store),
            ModelHandle::Unavailable(reason) => Err(PipelineError::ModelUnavailable(reason.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelHandle::Ready(_))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::classifier::{LogisticRegression, MultiClass};
    use crate::model::imputer::ImputeStrategy;
    use crate::model::scaler::ScalerKind;

    /// A small consistent artifact set over `Feature1..3` plus `sum`.
    pub(crate) fn demo_store() -> ArtifactStore {
        let names: Vec<String> = ["Feature1", "Feature2", "Feature3", "sum"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let imputer = SimpleImputer {
            strategy: ImputeStrategy::Mean,
            statistics: vec![1.5, 2.0, 2.5, 6.0],
            feature_names_in: Some(names.clone()),
        };
        let scaler = Scaler {
            kind: ScalerKind::Standard {
                mean: vec![1.5, 2.0, 2.5, 6.0],
                scale: vec![1.0, 1.0, 1.0, 3.0],
            },
            feature_names_in: Some(names),
        };
        let classifier = Estimator::LogisticRegression(LogisticRegression {
            classes: vec![0, 1, 2],
            coef: vec![
                vec![0.0, 0.0, 0.0, -2.0],
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 2.0],
            ],
            intercept: vec![0.0, 0.5, 0.0],
            multi_class: MultiClass::Multinomial,
        });
        ArtifactStore::new(imputer, scaler, classifier).unwrap()
    }

    fn write_store(dir: &Path) -> ArtifactPaths {
        let store = demo_store();
        let paths = ArtifactPaths::in_dir(dir);
        std::fs::write(&paths.imputer, serde_json::to_string(store.imputer()).unwrap()).unwrap();
        std::fs::write(&paths.scaler, serde_json::to_string(store.scaler()).unwrap()).unwrap();
        std::fs::write(
            &paths.classifier,
            serde_json::to_string(store.classifier()).unwrap(),
        )
        .unwrap();
        paths
    }

    #[test]
    fn test_default_paths() {
        let paths = ArtifactPaths::default();
        assert_eq!(paths.imputer, Path::new("model_web/imputer.json"));
        assert_eq!(paths.classifier, Path::new("model_web/stacking_model.json"));
    }

    #[test]
    fn test_generated_demo_artifacts_load_and_predict() {
        use crate::data::features::build_features;
        use crate::data::loader::read_csv;
        use crate::data::model::Diagnosis;

        let (imputer, scaler, classifier) = crate::generate_sample::artifacts();
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        std::fs::write(&paths.imputer, imputer.to_string()).unwrap();
        std::fs::write(&paths.scaler, scaler.to_string()).unwrap();
        std::fs::write(&paths.classifier, classifier.to_string()).unwrap();

        let store = ArtifactStore::load(&paths).unwrap();
        assert_eq!(store.n_features_in(), 4);

        let table = read_csv(
            "ID,Feature1,Feature2,Feature3\ncn,1,1,1\nmci,2,2,2\nad,3.5,3.5,3.5\n".as_bytes(),
        )
        .unwrap();
        let features = build_features(&table).unwrap();
        assert_eq!(
            crate::pipeline::predict(&store, &features).unwrap(),
            vec![Diagnosis::Cn, Diagnosis::Mci, Diagnosis::Ad]
        );
    }

    #[test]
    fn test_load_round_trip_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_store(dir.path());
        let handle = ModelHandle::load(&paths);
        assert!(handle.is_ready());
        assert_eq!(handle.store().unwrap().n_features_in(), 4);
    }

    #[test]
    fn test_missing_file_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let err = ArtifactStore::load(&paths).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ArtifactLoad {
                artifact: "imputer",
                ..
            }
        ));

        let handle = ModelHandle::load(&paths);
        assert!(!handle.is_ready());
        assert!(matches!(
            handle.store(),
            Err(PipelineError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_corrupt_file_names_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_store(dir.path());
        std::fs::write(&paths.scaler, "{not json").unwrap();
        let err = ArtifactStore::load(&paths).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactLoad { artifact: "scaler", .. }));
    }

    #[test]
    fn test_width_disagreement_is_load_error() {
        let store = demo_store();
        let mut imputer = store.imputer().clone();
        imputer.statistics.pop();
        imputer.feature_names_in = None;
        let err = ArtifactStore::new(imputer, store.scaler().clone(), store.classifier().clone())
            .unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_unknown_class_label_rejected() {
        let store = demo_store();
        let classifier = Estimator::LogisticRegression(LogisticRegression {
            classes: vec![0, 5],
            coef: vec![vec![1.0; 4]],
            intercept: vec![0.0],
            multi_class: MultiClass::Multinomial,
        });
        let err = ArtifactStore::new(store.imputer().clone(), store.scaler().clone(), classifier)
            .unwrap_err();
        assert!(err.to_string().contains("outside"));
    }
}
