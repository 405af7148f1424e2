/// Training and serving pipeline for enrollment prediction
///
/// - Dataset partitioning and stratified train/test split
/// - Preprocessing: imputation, standard scaling, one-hot encoding
/// - Logistic regression classifier
/// - Held-out evaluation metrics
/// - Decision rules mapping probabilities to confidence and recommendation

pub mod classifier;
pub mod dataset;
pub mod decision;
pub mod evaluation;
pub mod features;
pub mod models;
pub mod service;

pub use classifier::{Classifier, LogisticRegressionClassifier, DECISION_THRESHOLD};
pub use dataset::{get_feature_sets, split, FeatureSets, Frame, Split, Value};
pub use decision::{confidence_for, decide, recommendation_for, round_probability};
pub use evaluation::evaluate;
pub use features::{CategoricalColumn, FeaturePipeline, NumericColumn};
pub use models::{Metrics, ModelMetadata, ModelType, TrainingConfig};
pub use service::{train, EnrollmentModel, PredictionService};
