use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Dataset does not contain the requested target column
    #[error("Missing target column: {0}")]
    MissingTarget(String),

    /// A stratified split would leave one partition without a class
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Evaluation set contains a single class, ROC-AUC is undefined
    #[error("Degenerate evaluation: {0}")]
    DegenerateEvaluation(String),

    /// Pipeline or classifier used before fit
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// Serving requested before an artifact was loaded
    #[error("Model not loaded. Run 'enroll-cli train' to train the model first.")]
    ModelNotLoaded,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Optimizer failure while fitting the classifier
    #[error("Training error: {0}")]
    Training(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingTarget(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DegenerateEvaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFitted(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Training(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::MissingTarget(_) => "MISSING_TARGET",
            AppError::InsufficientData(_) => "INSUFFICIENT_DATA",
            AppError::DegenerateEvaluation(_) => "DEGENERATE_EVALUATION",
            AppError::NotFitted(_) => "NOT_FITTED",
            AppError::ModelNotLoaded => "MODEL_NOT_LOADED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let message = self.to_string();

        tracing::error!(
            error_code = %error_code,
            status_code = status.as_u16(),
            message = %message,
            "Request error"
        );

        crate::metrics::PREDICTION_ERRORS_TOTAL
            .with_label_values(&[error_code.as_str()])
            .inc();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Serialization(format!("csv: {}", err))
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from axum's JSON body rejection
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::ModelNotLoaded.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Validation("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MissingTarget("enrolled".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Training("diverged".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::ModelNotLoaded.error_code(), "MODEL_NOT_LOADED");
        assert_eq!(
            AppError::DegenerateEvaluation("one class".to_string()).error_code(),
            "DEGENERATE_EVALUATION"
        );
        assert_eq!(
            AppError::InsufficientData("empty".to_string()).error_code(),
            "INSUFFICIENT_DATA"
        );
        assert_eq!(
            AppError::NotFitted("pipeline".to_string()).error_code(),
            "NOT_FITTED"
        );
    }

    #[test]
    fn test_configuration_is_server_error() {
        let err = AppError::Configuration("no column 'employee_id'".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = AppError::MissingTarget("enrolled".to_string());
        assert!(err.to_string().contains("enrolled"));
    }
}
