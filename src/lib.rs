//! Employee insurance-enrollment prediction: offline training pipeline,
//! persisted model artifact and an HTTP serving layer.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod state;

pub use error::{AppError, Result};
