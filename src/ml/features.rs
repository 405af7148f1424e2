use crate::error::{AppError, Result};
use crate::ml::dataset::{Frame, Value};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standard deviations below this are treated as a constant column
pub const STD_EPSILON: f64 = 1e-12;

/// Learned imputation and scaling state for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub std: f64,
}

impl NumericColumn {
    fn encode(&self, value: &Value) -> Result<f64> {
        let raw = match value {
            Value::Number(n) => *n,
            Value::Missing => self.median,
            Value::Text(s) => {
                return Err(AppError::Validation(format!(
                    "column '{}' expects a number, got '{}'",
                    self.name, s
                )))
            }
        };
        Ok((raw - self.mean) / self.std)
    }
}

/// Learned imputation value and one-hot vocabulary for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub most_frequent: String,
    /// Sorted distinct categories seen during fit
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    fn encode_into(&self, value: &Value, out: &mut [f64]) {
        let category = value
            .category()
            .unwrap_or_else(|| self.most_frequent.clone());
        // unseen categories leave the block at zero
        if let Ok(idx) = self.categories.binary_search(&category) {
            out[idx] = 1.0;
        }
    }
}

/// Fit-once preprocessing: median/most-frequent imputation, standard scaling
/// of numeric columns and one-hot encoding of categorical columns.
///
/// Output layout is every numeric column in fit order followed by one block
/// per categorical column, each block in vocabulary order. The layout is part
/// of the persisted model and must never change after fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
    n_features: usize,
    is_fitted: bool,
}

impl FeaturePipeline {
    /// Create an unfitted pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn imputation, scaling and vocabulary state from training rows
    pub fn fit(&mut self, x: &Frame, numeric: &[String], categorical: &[String]) -> Result<()> {
        if x.n_rows() == 0 {
            return Err(AppError::InsufficientData(
                "cannot fit preprocessing on an empty frame".to_string(),
            ));
        }

        self.numeric = numeric
            .iter()
            .map(|name| {
                let idx = Self::require_column(x, name)?;
                Ok(Self::fit_numeric(x, idx, name))
            })
            .collect::<Result<Vec<_>>>()?;

        self.categorical = categorical
            .iter()
            .map(|name| {
                let idx = Self::require_column(x, name)?;
                Ok(Self::fit_categorical(x, idx, name))
            })
            .collect::<Result<Vec<_>>>()?;

        self.n_features = self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>();

        self.is_fitted = true;

        tracing::debug!(
            n_numeric = self.numeric.len(),
            n_categorical = self.categorical.len(),
            n_features = self.n_features,
            "Preprocessing pipeline fitted"
        );

        Ok(())
    }

    /// Transform rows into the fitted feature layout
    pub fn transform(&self, x: &Frame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(AppError::NotFitted(
                "FeaturePipeline must be fitted before transform".to_string(),
            ));
        }

        // a fitted column absent from the input is an artifact/schema mismatch
        let numeric_idx = self
            .numeric
            .iter()
            .map(|c| Self::fitted_column(x, &c.name))
            .collect::<Result<Vec<_>>>()?;
        let categorical_idx = self
            .categorical
            .iter()
            .map(|c| Self::fitted_column(x, &c.name))
            .collect::<Result<Vec<_>>>()?;
        let missing = Value::Missing;

        let mut features = Array2::zeros((x.n_rows(), self.n_features));

        for (i, row) in x.rows().iter().enumerate() {
            let mut out = features.row_mut(i);
            let out = out
                .as_slice_mut()
                .ok_or_else(|| AppError::Internal("feature row is not contiguous".to_string()))?;

            let mut offset = 0;
            for (column, &idx) in self.numeric.iter().zip(&numeric_idx) {
                out[offset] = column.encode(row.get(idx).unwrap_or(&missing))?;
                offset += 1;
            }
            for (column, &idx) in self.categorical.iter().zip(&categorical_idx) {
                let width = column.categories.len();
                column.encode_into(
                    row.get(idx).unwrap_or(&missing),
                    &mut out[offset..offset + width],
                );
                offset += width;
            }
        }

        Ok(features)
    }

    /// Fit and transform in one step
    pub fn fit_transform(
        &mut self,
        x: &Frame,
        numeric: &[String],
        categorical: &[String],
    ) -> Result<Array2<f64>> {
        self.fit(x, numeric, categorical)?;
        self.transform(x)
    }

    /// Names of the output features, `column=category` for one-hot slots
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|c| c.name.clone()).collect();
        for column in &self.categorical {
            for category in &column.categories {
                names.push(format!("{}={}", column.name, category));
            }
        }
        names
    }

    pub fn numeric_columns(&self) -> &[NumericColumn] {
        &self.numeric
    }

    pub fn categorical_columns(&self) -> &[CategoricalColumn] {
        &self.categorical
    }

    /// Get number of features
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Check if fitted
    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn require_column(x: &Frame, name: &str) -> Result<usize> {
        x.column_index(name)
            .ok_or_else(|| AppError::Validation(format!("missing column '{}'", name)))
    }

    fn fitted_column(x: &Frame, name: &str) -> Result<usize> {
        x.column_index(name).ok_or_else(|| {
            AppError::Configuration(format!(
                "input has no column '{}' required by the fitted pipeline",
                name
            ))
        })
    }

    fn fit_numeric(x: &Frame, idx: usize, name: &str) -> NumericColumn {
        let present: Vec<f64> = x.column(idx).filter_map(Value::as_number).collect();

        let median = match median(&present) {
            Some(m) => m,
            None => {
                tracing::warn!(column = name, "Numeric column has no values, imputing 0.0");
                0.0
            }
        };

        let imputed: Vec<f64> = x
            .column(idx)
            .map(|v| v.as_number().unwrap_or(median))
            .collect();
        let n = imputed.len() as f64;
        let mean = imputed.iter().sum::<f64>() / n;
        let variance = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        NumericColumn {
            name: name.to_string(),
            median,
            mean,
            std: if std < STD_EPSILON { 1.0 } else { std },
        }
    }

    fn fit_categorical(x: &Frame, idx: usize, name: &str) -> CategoricalColumn {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for category in x.column(idx).filter_map(Value::category) {
            *counts.entry(category).or_insert(0) += 1;
        }

        // strict comparison keeps the smallest category on ties
        let mut most_frequent: Option<(&String, usize)> = None;
        for (category, &count) in &counts {
            if most_frequent.map_or(true, |(_, best)| count > best) {
                most_frequent = Some((category, count));
            }
        }

        let most_frequent = match most_frequent {
            Some((category, _)) => category.clone(),
            None => {
                tracing::warn!(column = name, "Categorical column has no values");
                String::new()
            }
        };

        CategoricalColumn {
            name: name.to_string(),
            most_frequent,
            categories: counts.into_keys().collect(),
        }
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
