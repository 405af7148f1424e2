use crate::error::{AppError, Result};
use crate::ml::models::{ModelMetadata, ModelType, TrainingConfig};
use linfa::prelude::*;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Probability at or above which the positive label is assigned
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Trait for binary classifiers over preprocessed features
pub trait Classifier: Send + Sync {
    /// Train the classifier on 0/1 labels
    fn fit(&mut self, features: &Array2<f64>, labels: &[usize]) -> Result<()>;

    /// Positive-class probability per row
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>>;

    /// Hard labels, derived from `predict_proba` at the fixed threshold
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(features)?
            .iter()
            .map(|&p| usize::from(p >= DECISION_THRESHOLD))
            .collect())
    }

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Get model type
    fn model_type(&self) -> ModelType;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// L2-regularized logistic regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegressionClassifier {
    /// Model metadata
    metadata: ModelMetadata,

    max_iterations: u64,

    alpha: f64,

    /// Model weights (for serialization)
    weights: Option<Array1<f64>>,

    /// Model bias (for serialization)
    bias: Option<f64>,
}

impl LogisticRegressionClassifier {
    pub fn new(max_iterations: u64, alpha: f64) -> Self {
        let mut metadata = ModelMetadata::new(ModelType::LogisticRegression);
        metadata
            .hyperparameters
            .insert("max_iterations".to_string(), max_iterations.to_string());
        metadata
            .hyperparameters
            .insert("alpha".to_string(), alpha.to_string());

        Self {
            metadata,
            max_iterations,
            alpha,
            weights: None,
            bias: None,
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(config.max_iterations, config.alpha)
    }

    pub fn weights(&self) -> Option<&Array1<f64>> {
        self.weights.as_ref()
    }

    pub fn bias(&self) -> Option<f64> {
        self.bias
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }
}

impl Classifier for LogisticRegressionClassifier {
    fn fit(&mut self, features: &Array2<f64>, labels: &[usize]) -> Result<()> {
        if features.nrows() != labels.len() {
            return Err(AppError::Validation(format!(
                "feature rows ({}) and labels ({}) differ in length",
                features.nrows(),
                labels.len()
            )));
        }
        if labels.iter().any(|&l| l > 1) {
            return Err(AppError::Validation("labels must be 0 or 1".to_string()));
        }

        let targets = Array1::from_vec(labels.to_vec());
        let dataset = Dataset::new(features.clone(), targets);

        let model = LogisticRegression::default()
            .max_iterations(self.max_iterations)
            .alpha(self.alpha)
            .fit(&dataset)
            .map_err(|e| AppError::Training(format!("Failed to train logistic regression: {}", e)))?;

        let mut weights = model.params().clone();
        let mut bias = model.intercept();

        // The fitted model scores whichever class it picked as positive; align to label 1
        let probabilities = model.predict_probabilities(features);
        let predicted: Array1<usize> = model.predict(features);
        if let Some(i) = (0..probabilities.len()).max_by(|&a, &b| {
            (probabilities[a] - 0.5)
                .abs()
                .total_cmp(&(probabilities[b] - 0.5).abs())
        }) {
            let scores_label_one = (probabilities[i] >= 0.5) == (predicted[i] == 1);
            if !scores_label_one {
                weights.mapv_inplace(|w| -w);
                bias = -bias;
            }
        }

        self.weights = Some(weights);
        self.bias = Some(bias);

        self.metadata.n_training_samples = features.nrows();
        self.metadata.n_features = features.ncols();
        self.metadata.trained_at = chrono::Utc::now();

        tracing::debug!(
            n_samples = features.nrows(),
            n_features = features.ncols(),
            "Logistic regression fitted"
        );

        Ok(())
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let (weights, bias) = match (&self.weights, self.bias) {
            (Some(w), Some(b)) => (w, b),
            _ => {
                return Err(AppError::NotFitted(
                    "Logistic regression must be fitted before predict".to_string(),
                ))
            }
        };

        if features.ncols() != weights.len() {
            return Err(AppError::Validation(format!(
                "expected {} features, got {}",
                weights.len(),
                features.ncols()
            )));
        }

        Ok(features.dot(weights).mapv(|z| Self::sigmoid(z + bias)))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn model_type(&self) -> ModelType {
        ModelType::LogisticRegression
    }

    fn is_trained(&self) -> bool {
        self.weights.is_some()
    }
}
