use std::path::Path;

use crate::data::features::build_features;
use crate::data::loader;
use crate::data::model::{Diagnosis, FeatureMatrix, RawTable, ResultTable};
use crate::error::PipelineError;
use crate::model::{ArtifactStore, Classifier, ModelHandle, Transformer};

// ---------------------------------------------------------------------------
// Prediction pipeline
// ---------------------------------------------------------------------------

/// Impute, scale, classify. All rows are labelled or the call fails.
pub fn predict(store: &ArtifactStore, features: &FeatureMatrix) -> Result<Vec<Diagnosis>, PipelineError> {
    let imputed = store.imputer().transform(features)?;
    let scaled = store.scaler().transform(&imputed)?;
    let labels = store.classifier().predict(&scaled.values)?;

    if labels.len() != features.nrows() {
        return Err(PipelineError::schema(
            "classifier",
            format!("{} labels for {} rows", labels.len(), features.nrows()),
        ));
    }
    labels.into_iter().map(Diagnosis::try_from).collect()
}

/// Run an ingested table through feature construction and prediction.
pub fn analyze(model: &ModelHandle, table: RawTable) -> Result<ResultTable, PipelineError> {
    let store = model.store()?;
    let features = build_features(&table)?;
    let predictions = predict(store, &features)?;
    ResultTable::new(table, predictions)
}

/// Full upload path: refuse early when the model is unavailable, then
/// load, build features and predict.
pub fn analyze_file(model: &ModelHandle, path: &Path) -> Result<ResultTable, PipelineError> {
    model.store()?;
    let table = loader::load_file(path)?;
    analyze(model, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::model::artifacts::tests::demo_store;

    const SCENARIO: &str = "ID,Feature1,Feature2,Feature3\n\
                            s1,0.5,2.1,1.1\n\
                            s2,1.2,0.8,3.0\n\
                            s3,3.3,4.5,2.8\n";

    #[test]
    fn test_scenario_end_to_end() {
        let model = ModelHandle::Ready(demo_store());
        let table = read_csv(SCENARIO.as_bytes()).unwrap();
        let result = analyze(&model, table).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(
            result.predictions,
            vec![Diagnosis::Cn, Diagnosis::Cn, Diagnosis::Ad]
        );
        assert_eq!(result.columns().len(), 5);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let store = demo_store();
        let table = read_csv(SCENARIO.as_bytes()).unwrap();
        let features = build_features(&table).unwrap();
        let first = predict(&store, &features).unwrap();
        let second = predict(&store, &features).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_values_are_imputed_before_classification() {
        let store = demo_store();
        let table = read_csv("ID,Feature1,Feature2,Feature3\ns1,--,--,--\n".as_bytes()).unwrap();
        let features = build_features(&table).unwrap();
        let imputed = store.imputer().transform(&features).unwrap();
        assert!(imputed.values.iter().all(|v| v.is_finite()));
        // `sum` is computed before imputation, so an all-missing row sums to 0.
        assert_eq!(imputed.values[[0, 3]], 0.0);
        assert_eq!(predict(&store, &features).unwrap(), vec![Diagnosis::Cn]);
    }

    #[test]
    fn test_wrong_columns_are_schema_mismatch() {
        let model = ModelHandle::Ready(demo_store());
        let table = read_csv("ID,Feature1,Feature2\ns1,1,2\n".as_bytes()).unwrap();
        assert!(matches!(
            analyze(&model, table),
            Err(PipelineError::SchemaMismatch { stage: "imputer", .. })
        ));

        let renamed = read_csv("ID,A,B,C\ns1,1,2,3\n".as_bytes()).unwrap();
        assert!(matches!(
            analyze(&model, renamed),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_type_mismatch_produces_no_result() {
        let model = ModelHandle::Ready(demo_store());
        let table = read_csv("ID,Feature1,Feature2,Feature3\ns1,1,x,3\n".as_bytes()).unwrap();
        assert!(matches!(
            analyze(&model, table),
            Err(PipelineError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_non_finite_uploads_are_rejected() {
        let model = ModelHandle::Ready(demo_store());
        let infinite = read_csv("ID,Feature1,Feature2,Feature3\ns1,inf,1,1\n".as_bytes()).unwrap();
        assert!(matches!(
            analyze(&model, infinite),
            Err(PipelineError::TypeMismatch { row: 1, .. })
        ));

        let overflow =
            read_csv("ID,Feature1,Feature2,Feature3\ns1,1e308,1e308,1\n".as_bytes()).unwrap();
        assert!(matches!(
            analyze(&model, overflow),
            Err(PipelineError::NonFinite { stage: "features", row: 1 })
        ));

        let large = read_csv("ID,Feature1,Feature2,Feature3\ns1,100,100,100\n".as_bytes()).unwrap();
        assert_eq!(analyze(&model, large).unwrap().predictions, vec![Diagnosis::Ad]);
    }

    #[test]
    fn test_na_tokens_are_imputed() {
        let model = ModelHandle::Ready(demo_store());
        let table =
            read_csv("ID,Feature1,Feature2,Feature3\ns1,NaN,NA,null\n".as_bytes()).unwrap();
        assert_eq!(analyze(&model, table).unwrap().predictions, vec![Diagnosis::Cn]);
    }

    #[test]
    fn test_degraded_mode_rejects_uploads() {
        let model = ModelHandle::Unavailable("imputer.json missing".to_string());
        let table = read_csv(SCENARIO.as_bytes()).unwrap();
        assert!(matches!(
            analyze(&model, table),
            Err(PipelineError::ModelUnavailable(_))
        ));
        assert!(matches!(
            analyze_file(&model, Path::new("does-not-matter.csv")),
            Err(PipelineError::ModelUnavailable(_))
        ));
    }
}
