use crate::error::{AppError, Result};
use crate::metrics::{
    BATCH_SIZE, PREDICTIONS_TOTAL, PREDICTION_DURATION_SECONDS, TRAINING_RUNS_TOTAL,
};
use crate::ml::classifier::{Classifier, LogisticRegressionClassifier};
use crate::ml::dataset::{get_feature_sets, split, FeatureSets, Frame};
use crate::ml::decision::decide;
use crate::ml::evaluation::evaluate;
use crate::ml::features::FeaturePipeline;
use crate::ml::models::{Metrics, ModelMetadata, TrainingConfig};
use crate::models::{
    EmployeeRecord, ModelInfo, PredictionResult, FEATURE_NAMES, NUMERIC_FEATURE_NAMES,
};
use crate::state::ArtifactStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

/// Fitted preprocessing plus classifier, persisted and loaded as one artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentModel {
    pipeline: FeaturePipeline,
    classifier: LogisticRegressionClassifier,
}

impl EnrollmentModel {
    pub fn new(pipeline: FeaturePipeline, classifier: LogisticRegressionClassifier) -> Self {
        Self {
            pipeline,
            classifier,
        }
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn classifier(&self) -> &LogisticRegressionClassifier {
        &self.classifier
    }

    pub fn metadata(&self) -> &ModelMetadata {
        self.classifier.metadata()
    }

    /// Hard label and raw positive-class probability per row
    pub fn score(&self, frame: &Frame) -> Result<Vec<(bool, f64)>> {
        let features = self.pipeline.transform(frame)?;
        let proba = self.classifier.predict_proba(&features)?;
        let labels = self.classifier.predict(&features)?;
        Ok(labels
            .into_iter()
            .zip(proba.iter().copied())
            .map(|(label, p)| (label == 1, p))
            .collect())
    }

    /// Score validated records and apply the decision rules
    pub fn predict(&self, records: &[EmployeeRecord]) -> Result<Vec<PredictionResult>> {
        let frame = EmployeeRecord::to_frame(records);
        Ok(self
            .score(&frame)?
            .into_iter()
            .map(|(label, p)| decide(label, p))
            .collect())
    }
}

/// Run the full offline pipeline: partition, split, fit, evaluate.
pub fn train(dataset: &Frame, config: &TrainingConfig) -> Result<(EnrollmentModel, Metrics)> {
    let result = run_training(dataset, config);
    let outcome = if result.is_ok() { "success" } else { "failure" };
    TRAINING_RUNS_TOTAL.with_label_values(&[outcome]).inc();
    result
}

fn run_training(dataset: &Frame, config: &TrainingConfig) -> Result<(EnrollmentModel, Metrics)> {
    info!(
        rows = dataset.n_rows(),
        columns = dataset.n_cols(),
        target = %config.target,
        "Starting training run"
    );

    let sets = get_feature_sets(dataset, &config.target)?;
    info!(
        numeric = ?sets.numeric,
        categorical = ?sets.categorical,
        "Partitioned feature columns"
    );
    check_schema(&sets)?;

    let parts = split(&sets.x, &sets.y, config.test_fraction, config.seed)?;
    info!(
        train = parts.y_train.len(),
        test = parts.y_test.len(),
        "Stratified split complete"
    );

    let mut pipeline = FeaturePipeline::new();
    let x_train = pipeline.fit_transform(&parts.x_train, &sets.numeric, &sets.categorical)?;

    let mut classifier = LogisticRegressionClassifier::from_config(config);
    classifier.fit(&x_train, &parts.y_train)?;

    let x_test = pipeline.transform(&parts.x_test)?;
    let y_prob = classifier.predict_proba(&x_test)?.to_vec();
    let y_pred = classifier.predict(&x_test)?;
    let metrics = evaluate(&parts.y_test, &y_pred, &y_prob)?;

    info!(
        accuracy = metrics.accuracy,
        precision = metrics.precision,
        recall = metrics.recall,
        f1 = metrics.f1,
        roc_auc = metrics.roc_auc,
        n_features = pipeline.n_features(),
        "Training complete"
    );

    Ok((EnrollmentModel::new(pipeline, classifier), metrics))
}

/// Training columns must match what `EmployeeRecord::to_frame` produces, by name and type
fn check_schema(sets: &FeatureSets) -> Result<()> {
    let numeric: BTreeSet<&str> = sets.numeric.iter().map(String::as_str).collect();
    let categorical: BTreeSet<&str> = sets.categorical.iter().map(String::as_str).collect();
    let expected_numeric: BTreeSet<&str> = NUMERIC_FEATURE_NAMES.into_iter().collect();
    let expected_categorical: BTreeSet<&str> = FEATURE_NAMES
        .into_iter()
        .filter(|name| !expected_numeric.contains(name))
        .collect();

    if numeric == expected_numeric && categorical == expected_categorical {
        return Ok(());
    }

    let found: BTreeSet<&str> = numeric.union(&categorical).copied().collect();
    let expected: BTreeSet<&str> = FEATURE_NAMES.into_iter().collect();
    let unexpected: Vec<&str> = found.difference(&expected).copied().collect();
    let missing: Vec<&str> = expected.difference(&found).copied().collect();
    let mistyped: Vec<&str> = expected_numeric
        .symmetric_difference(&numeric)
        .copied()
        .filter(|name| expected.contains(name) && found.contains(name))
        .collect();

    Err(AppError::Validation(format!(
        "dataset columns do not match the employee schema: unexpected {:?}, missing {:?}, mistyped {:?}",
        unexpected, missing, mistyped
    )))
}

/// Read-only serving facade over an optionally loaded model
#[derive(Debug, Clone)]
pub struct PredictionService {
    model: Option<Arc<EnrollmentModel>>,
    metrics: Option<Metrics>,
    max_batch_size: usize,
}

impl PredictionService {
    /// Create a service with no model loaded
    pub fn new(max_batch_size: usize) -> Self {
        Self {
            model: None,
            metrics: None,
            max_batch_size,
        }
    }

    pub fn with_model(mut self, model: EnrollmentModel, metrics: Metrics) -> Self {
        self.model = Some(Arc::new(model));
        self.metrics = Some(metrics);
        self
    }

    /// Load the artifact once; a missing or unreadable artifact leaves the service degraded
    pub fn from_store(store: &dyn ArtifactStore, max_batch_size: usize) -> Self {
        let service = Self::new(max_batch_size);

        if !store.exists() {
            warn!("No trained model found, serving in degraded mode");
            return service;
        }

        match store.load() {
            Ok((model, metrics)) => {
                info!(
                    model_type = %model.metadata().model_type,
                    trained_at = %model.metadata().trained_at,
                    n_features = model.pipeline().n_features(),
                    "Model loaded"
                );
                service.with_model(model, metrics)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load model, serving in degraded mode");
                service
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn model(&self) -> Result<&EnrollmentModel> {
        self.model.as_deref().ok_or(AppError::ModelNotLoaded)
    }

    /// Predict enrollment for one employee
    pub fn predict(&self, employee: &EmployeeRecord) -> Result<PredictionResult> {
        employee.validate()?;
        let model = self.model()?;

        let timer = PREDICTION_DURATION_SECONDS
            .with_label_values(&["single"])
            .start_timer();
        let result = model
            .predict(std::slice::from_ref(employee))?
            .pop()
            .ok_or_else(|| AppError::Internal("model returned no prediction".to_string()))?;
        timer.observe_duration();

        PREDICTIONS_TOTAL
            .with_label_values(&[result.confidence.as_ref()])
            .inc();
        debug!(
            probability = result.probability,
            confidence = %result.confidence,
            "Prediction served"
        );

        Ok(result)
    }

    /// Predict for up to `max_batch_size` employees; any invalid record fails the batch
    pub fn predict_batch(&self, employees: &[EmployeeRecord]) -> Result<Vec<PredictionResult>> {
        if employees.len() > self.max_batch_size {
            return Err(AppError::Validation(format!(
                "Maximum {} employees per batch request",
                self.max_batch_size
            )));
        }
        if employees.is_empty() {
            return Ok(Vec::new());
        }

        for (i, employee) in employees.iter().enumerate() {
            employee
                .validate()
                .map_err(|e| AppError::Validation(format!("record {}: {}", i, e)))?;
        }
        let model = self.model()?;

        BATCH_SIZE.observe(employees.len() as f64);
        let timer = PREDICTION_DURATION_SECONDS
            .with_label_values(&["batch"])
            .start_timer();
        let results = model.predict(employees)?;
        timer.observe_duration();

        for result in &results {
            PREDICTIONS_TOTAL
                .with_label_values(&[result.confidence.as_ref()])
                .inc();
        }
        debug!(count = results.len(), "Batch prediction served");

        Ok(results)
    }

    /// Persisted held-out metrics plus the fixed input schema
    pub fn model_info(&self) -> Result<ModelInfo> {
        let model = self.model()?;
        let metrics = self.metrics.as_ref().ok_or(AppError::ModelNotLoaded)?;
        Ok(ModelInfo::new(
            format!("{} with preprocessing pipeline", model.metadata().model_type),
            metrics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::dataset::Value;
    use crate::models::{
        Confidence, EmploymentType, Gender, HasDependents, MaritalStatus, Region,
    };
    use crate::state::InMemoryArtifactStore;

    fn employee(age: i64, salary: f64, region: Region) -> EmployeeRecord {
        EmployeeRecord {
            age,
            gender: Gender::Female,
            marital_status: MaritalStatus::Married,
            salary,
            employment_type: EmploymentType::FullTime,
            region,
            has_dependents: HasDependents::Yes,
            tenure_years: 4.0,
        }
    }

    /// Enrollment driven by salary, with a little label noise
    fn dataset(n: usize) -> Frame {
        let mut columns: Vec<String> = crate::models::FEATURE_NAMES
            .iter()
            .map(|c| c.to_string())
            .collect();
        columns.push("enrolled".to_string());

        let regions = [Region::West, Region::South, Region::Midwest, Region::Northeast];
        let rows = (0..n)
            .map(|i| {
                let salary = 30_000.0 + (i as f64) * 1_000.0;
                let record = employee(20 + (i % 40) as i64, salary, regions[i % 4]);
                let mut values = record.to_values();
                let enrolled = (salary > 30_000.0 + n as f64 * 500.0) != (i % 53 == 0);
                values.push(Value::Number(if enrolled { 1.0 } else { 0.0 }));
                values
            })
            .collect();
        Frame::new(columns, rows)
    }

    fn trained() -> (EnrollmentModel, Metrics) {
        train(&dataset(120), &TrainingConfig::default()).unwrap()
    }

    #[test]
    fn test_train_produces_bounded_metrics() {
        let (model, metrics) = trained();
        for value in [
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1,
            metrics.roc_auc,
        ] {
            assert!((0.0..=1.0).contains(&value));
        }
        assert!(metrics.roc_auc > 0.7);
        assert!(model.classifier().is_trained());
        assert_eq!(model.metadata().n_training_samples, 96);
    }

    #[test]
    fn test_train_requires_target() {
        let config = TrainingConfig {
            target: "signed_up".to_string(),
            ..TrainingConfig::default()
        };
        let err = train(&dataset(40), &config).unwrap_err();
        assert!(matches!(err, AppError::MissingTarget(_)));
    }

    #[test]
    fn test_train_rejects_columns_outside_schema() {
        let base = dataset(120);
        let mut columns = base.columns().to_vec();
        columns.insert(0, "employee_id".to_string());
        let rows = base
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut values = vec![Value::Number(i as f64)];
                values.extend(row.iter().cloned());
                values
            })
            .collect();

        let err = train(&Frame::new(columns, rows), &TrainingConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("employee_id")));
    }

    #[test]
    fn test_train_rejects_mistyped_column() {
        let base = dataset(120);
        let salary = base.column_index("salary").unwrap();
        let rows = base
            .rows()
            .iter()
            .map(|row| {
                let mut values = row.clone();
                values[salary] = Value::Text(format!("${}", row[salary].as_number().unwrap()));
                values
            })
            .collect();

        let err = train(&Frame::new(base.columns().to_vec(), rows), &TrainingConfig::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("mistyped [\"salary\"]")));
    }

    #[test]
    fn test_predict_without_model() {
        let service = PredictionService::new(100);
        let err = service
            .predict(&employee(35, 75_000.0, Region::West))
            .unwrap_err();
        assert!(matches!(err, AppError::ModelNotLoaded));
        assert!(matches!(service.model_info(), Err(AppError::ModelNotLoaded)));
    }

    #[test]
    fn test_validation_precedes_model_check() {
        let service = PredictionService::new(100);
        let err = service
            .predict(&employee(12, 75_000.0, Region::West))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_predict_label_matches_probability() {
        let (model, metrics) = trained();
        let service = PredictionService::new(100).with_model(model.clone(), metrics);

        for salary in [20_000.0, 60_000.0, 90_000.0, 200_000.0] {
            let record = employee(35, salary, Region::South);
            let result = service.predict(&record).unwrap();
            let (label, p) = model.score(&EmployeeRecord::to_frame(&[record])).unwrap()[0];

            assert!((0.0..=1.0).contains(&result.probability));
            assert_eq!(result.enrolled, label);
            assert_eq!(label, p >= 0.5);
        }
    }

    #[test]
    fn test_salary_drives_probability() {
        let (model, metrics) = trained();
        let service = PredictionService::new(100).with_model(model, metrics);

        let low = service.predict(&employee(35, 20_000.0, Region::West)).unwrap();
        let high = service.predict(&employee(35, 200_000.0, Region::West)).unwrap();
        assert!(low.probability < high.probability);
        assert!(!low.enrolled);
        assert!(high.enrolled);
        assert_eq!(high.confidence, Confidence::High);
    }

    #[test]
    fn test_batch_matches_single_predictions() {
        let (model, metrics) = trained();
        let service = PredictionService::new(100).with_model(model, metrics);
        let records = vec![
            employee(25, 40_000.0, Region::West),
            employee(45, 120_000.0, Region::Northeast),
        ];

        let batch = service.predict_batch(&records).unwrap();
        assert_eq!(batch.len(), 2);
        for (record, result) in records.iter().zip(&batch) {
            assert_eq!(&service.predict(record).unwrap(), result);
        }
    }

    #[test]
    fn test_batch_cap_and_all_or_nothing() {
        let (model, metrics) = trained();
        let service = PredictionService::new(2).with_model(model, metrics);
        let ok = employee(30, 50_000.0, Region::West);

        let err = service
            .predict_batch(&[ok.clone(), ok.clone(), ok.clone()])
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("Maximum 2")));

        let bad = employee(30, -5.0, Region::West);
        let err = service.predict_batch(&[ok, bad]).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("record 1")));

        assert!(service.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_model_info() {
        let (model, metrics) = trained();
        let service = PredictionService::new(100).with_model(model, metrics);
        let info = service.model_info().unwrap();
        assert_eq!(info.model_type, "Logistic Regression with preprocessing pipeline");
        assert_eq!(info.accuracy, metrics.accuracy);
        assert_eq!(info.features.len(), 8);
        assert_eq!(info.target, "enrolled");
    }

    #[test]
    fn test_from_store() {
        let store = InMemoryArtifactStore::new();
        assert!(!PredictionService::from_store(&store, 100).is_loaded());

        let (model, metrics) = trained();
        store.save(&model, &metrics).unwrap();
        let service = PredictionService::from_store(&store, 100);
        assert!(service.is_loaded());
        assert_eq!(service.max_batch_size(), 100);
    }
}
