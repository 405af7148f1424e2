use crate::error::AppError;
use axum::extract::FromRequest;

/// `axum::Json` whose rejections render as `AppError::Validation`, so body errors
/// share the status and error body of out-of-range fields
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);
