use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Training run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// CSV dataset used for training
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Binary target column
    #[serde(default = "default_target")]
    pub target: String,

    /// Fraction of each class held out for evaluation (0.0 - 1.0)
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Seed for the stratified split
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Solver iteration cap
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,

    /// L2 regularization strength
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            target: default_target(),
            test_fraction: default_test_fraction(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            alpha: default_alpha(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("employee_data.csv")
}

fn default_target() -> String {
    crate::models::TARGET_NAME.to_string()
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_max_iterations() -> u64 {
    1000
}

fn default_alpha() -> f64 {
    1.0
}

/// Held-out evaluation metrics, persisted as a flat JSON document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model version
    pub version: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Hyperparameters
    pub hyperparameters: HashMap<String, String>,
}

impl ModelMetadata {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            name: model_type.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model_type,
            trained_at: chrono::Utc::now(),
            n_training_samples: 0,
            n_features: 0,
            hyperparameters: HashMap::new(),
        }
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Logistic regression
    LogisticRegression,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::LogisticRegression => write!(f, "Logistic Regression"),
        }
    }
}
