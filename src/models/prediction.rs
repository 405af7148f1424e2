use crate::ml::models::Metrics;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Confidence tier attached to a prediction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Serving response for one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted enrollment status
    pub enrolled: bool,

    /// Probability of enrollment, rounded to 4 decimal places
    pub probability: f64,

    /// Confidence level: high, medium, or low
    pub confidence: Confidence,

    /// Business recommendation based on prediction
    pub recommendation: String,
}

/// Batch prediction response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionResult {
    pub predictions: Vec<PredictionResult>,
    pub count: usize,
}

impl From<Vec<PredictionResult>> for BatchPredictionResult {
    fn from(predictions: Vec<PredictionResult>) -> Self {
        let count = predictions.len();
        Self { predictions, count }
    }
}

/// Model information and feature requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    pub features: Vec<String>,
    pub target: String,
}

impl ModelInfo {
    pub fn new(model_type: impl Into<String>, metrics: &Metrics) -> Self {
        Self {
            model_type: model_type.into(),
            accuracy: metrics.accuracy,
            precision: metrics.precision,
            recall: metrics.recall,
            f1_score: metrics.f1,
            roc_auc: metrics.roc_auc,
            features: super::FEATURE_NAMES.iter().map(|f| f.to_string()).collect(),
            target: super::TARGET_NAME.to_string(),
        }
    }
}
