use crate::api::{AppState, ValidJson};
use crate::error::Result;
use crate::models::*;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Root endpoint with API information
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Insurance Enrollment Prediction API".to_string(),
        health: "/health".to_string(),
        predict: "/predict".to_string(),
        model_info: "/model/info".to_string(),
        metrics: "/metrics".to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub health: String,
    pub predict: String,
    pub model_info: String,
    pub metrics: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.service.is_loaded();
    Json(HealthResponse {
        status: if model_loaded { "healthy" } else { "degraded" }.to_string(),
        model_loaded,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
}

/// Model metrics and input schema
pub async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfo>> {
    Ok(Json(state.service.model_info()?))
}

/// Predict enrollment for one employee
pub async fn predict(
    State(state): State<AppState>,
    ValidJson(employee): ValidJson<EmployeeRecord>,
) -> Result<Json<PredictionResult>> {
    Ok(Json(state.service.predict(&employee)?))
}

/// Predict enrollment for a list of employees
pub async fn predict_batch(
    State(state): State<AppState>,
    ValidJson(employees): ValidJson<Vec<EmployeeRecord>>,
) -> Result<Json<BatchPredictionResult>> {
    let predictions = state.service.predict_batch(&employees)?;
    Ok(Json(BatchPredictionResult::from(predictions)))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}
