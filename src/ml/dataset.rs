use crate::error::{AppError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Tokens read as a missing cell
const MISSING_TOKENS: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

static MISSING: Value = Value::Missing;

/// A single raw cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw CSV field
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if MISSING_TOKENS.contains(&trimmed) {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => Value::Number(number),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Category key used by the one-hot encoder
    pub fn category(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Missing => None,
        }
    }
}

/// Row-major table with named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Load a dataset from a CSV file with a header row
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("dataset not found: {}", path.display()),
            )));
        }

        let file = std::fs::File::open(path)?;
        let frame = Self::from_csv_reader(file)?;

        tracing::info!(
            path = %path.display(),
            rows = frame.n_rows(),
            columns = frame.n_cols(),
            "Dataset loaded"
        );

        Ok(frame)
    }

    /// Parse CSV content from any reader
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(Value::parse).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate one column's cells
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| row.get(idx).unwrap_or(&MISSING))
    }

    /// A column is numeric iff every present cell is a number
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        self.column(idx)
            .all(|value| matches!(value, Value::Number(_) | Value::Missing))
    }

    /// New frame holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    fn without_column(&self, idx: usize) -> Self {
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, c)| c.clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, v)| v.clone())
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }
}

/// Features, labels and column typing extracted from a labeled frame
#[derive(Debug, Clone)]
pub struct FeatureSets {
    pub x: Frame,
    pub y: Vec<usize>,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

/// Train/test partitions
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Frame,
    pub x_test: Frame,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
}

/// Separate the target from the features and type every feature column
pub fn get_feature_sets(dataset: &Frame, target: &str) -> Result<FeatureSets> {
    let target_idx = dataset
        .column_index(target)
        .ok_or_else(|| AppError::MissingTarget(target.to_string()))?;

    let y = dataset
        .column(target_idx)
        .enumerate()
        .map(|(row, value)| coerce_label(value, row))
        .collect::<Result<Vec<usize>>>()?;

    let x = dataset.without_column(target_idx);

    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    for (idx, name) in x.columns().iter().enumerate() {
        if x.is_numeric_column(idx) {
            numeric.push(name.clone());
        } else {
            categorical.push(name.clone());
        }
    }

    tracing::debug!(?numeric, ?categorical, "Feature columns typed");

    Ok(FeatureSets {
        x,
        y,
        numeric,
        categorical,
    })
}

fn coerce_label(value: &Value, row: usize) -> Result<usize> {
    let label = match value {
        Value::Number(n) if *n == 0.0 => Some(0),
        Value::Number(n) if *n == 1.0 => Some(1),
        Value::Text(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(1),
            "false" | "no" | "0" => Some(0),
            _ => None,
        },
        _ => None,
    };

    label.ok_or_else(|| {
        AppError::Validation(format!(
            "target value {:?} at row {} is not a binary label",
            value, row
        ))
    })
}

/// Stratified, seeded train/test split.
///
/// Each class contributes `round(n_class * test_fraction)` rows to the test
/// partition, so class proportions match the full set within rounding. Row
/// assignment depends only on `seed` and input order.
pub fn split(x: &Frame, y: &[usize], test_fraction: f64, seed: u64) -> Result<Split> {
    if x.n_rows() != y.len() {
        return Err(AppError::Validation(format!(
            "feature rows ({}) and labels ({}) differ in length",
            x.n_rows(),
            y.len()
        )));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AppError::Validation(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in y.iter().enumerate() {
        by_class.entry(label).or_default().push(idx);
    }

    for class in [0usize, 1] {
        if !by_class.contains_key(&class) {
            return Err(AppError::InsufficientData(format!(
                "class {} has no examples",
                class
            )));
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::with_capacity(y.len());
    let mut test_idx = Vec::with_capacity(y.len());

    for (class, mut indices) in by_class {
        let n_class = indices.len();
        let n_test = (n_class as f64 * test_fraction).round() as usize;
        if n_test == 0 || n_test == n_class {
            return Err(AppError::InsufficientData(format!(
                "class {} with {} examples cannot populate both partitions",
                class, n_class
            )));
        }

        indices.shuffle(&mut rng);
        test_idx.extend_from_slice(&indices[..n_test]);
        train_idx.extend_from_slice(&indices[n_test..]);
    }

    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    Ok(Split {
        x_train: x.select_rows(&train_idx),
        x_test: x.select_rows(&test_idx),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
age,gender,salary,region,enrolled
35,Male,75000,West,1
42,Female,,South,0
29,Other,51000.5,,1
";

    fn labeled_frame(n: usize, positive_every: usize) -> (Frame, Vec<usize>) {
        let columns = vec!["id".to_string(), "band".to_string()];
        let rows = (0..n)
            .map(|i| {
                vec![
                    Value::Number(i as f64),
                    Value::Text(format!("b{}", i % 3)),
                ]
            })
            .collect();
        let y = (0..n)
            .map(|i| usize::from(i % positive_every == 0))
            .collect();
        (Frame::new(columns, rows), y)
    }

    #[test]
    fn test_value_parsing() {
        assert_eq!(Value::parse("35"), Value::Number(35.0));
        assert_eq!(Value::parse(" 5.5 "), Value::Number(5.5));
        assert_eq!(Value::parse("Full-time"), Value::Text("Full-time".to_string()));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("NaN"), Value::Missing);
    }

    #[test]
    fn test_csv_loading_and_typing() {
        let frame = Frame::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.n_cols(), 5);

        let sets = get_feature_sets(&frame, "enrolled").unwrap();
        assert_eq!(sets.y, vec![1, 0, 1]);
        assert_eq!(sets.numeric, vec!["age", "salary"]);
        assert_eq!(sets.categorical, vec!["gender", "region"]);
        assert_eq!(sets.x.n_cols(), 4);
        assert!(sets.x.column_index("enrolled").is_none());
    }

    #[test]
    fn test_missing_target() {
        let frame = Frame::from_csv_reader(CSV.as_bytes()).unwrap();
        let err = get_feature_sets(&frame, "churned").unwrap_err();
        assert!(matches!(err, AppError::MissingTarget(ref t) if t == "churned"));
    }

    #[test]
    fn test_textual_labels_coerced() {
        let frame = Frame::from_csv_reader("x,enrolled\n1,True\n2,no\n3,YES\n".as_bytes()).unwrap();
        let sets = get_feature_sets(&frame, "enrolled").unwrap();
        assert_eq!(sets.y, vec![1, 0, 1]);
    }

    #[test]
    fn test_non_binary_label_rejected() {
        let frame = Frame::from_csv_reader("x,enrolled\n1,1\n2,2\n".as_bytes()).unwrap();
        let err = get_feature_sets(&frame, "enrolled").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("row 1")));
    }

    #[test]
    fn test_mixed_column_is_categorical() {
        let frame = Frame::from_csv_reader("code,enrolled\n10,1\nA7,0\n".as_bytes()).unwrap();
        let sets = get_feature_sets(&frame, "enrolled").unwrap();
        assert!(sets.numeric.is_empty());
        assert_eq!(sets.categorical, vec!["code"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Frame::load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    #[test]
    fn test_stratified_split_preserves_ratio() {
        // 400 rows, 100 positives
        let (x, y) = labeled_frame(400, 4);
        let split = split(&x, &y, 0.2, 42).unwrap();

        assert_eq!(split.x_train.n_rows() + split.x_test.n_rows(), 400);
        assert_eq!(split.y_test.len(), 80);
        assert_eq!(split.y_test.iter().filter(|&&l| l == 1).count(), 20);
        assert_eq!(split.y_train.iter().filter(|&&l| l == 1).count(), 80);
    }

    #[test]
    fn test_split_is_reproducible() {
        let (x, y) = labeled_frame(300, 3);
        let a = split(&x, &y, 0.2, 42).unwrap();
        let b = split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(a.x_test, b.x_test);
        assert_eq!(a.y_train, b.y_train);

        let c = split(&x, &y, 0.2, 7).unwrap();
        assert_ne!(a.x_test, c.x_test);
    }

    #[test]
    fn test_split_partitions_are_disjoint() {
        let (x, y) = labeled_frame(250, 5);
        let split = split(&x, &y, 0.2, 42).unwrap();

        let ids = |frame: &Frame| -> Vec<f64> {
            frame.column(0).filter_map(Value::as_number).collect()
        };
        let train = ids(&split.x_train);
        let test = ids(&split.x_test);
        assert!(test.iter().all(|id| !train.contains(id)));
    }

    #[test]
    fn test_split_rejects_single_class() {
        let (x, _) = labeled_frame(20, 2);
        let y = vec![0; 20];
        let err = split(&x, &y, 0.2, 42).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn test_split_rejects_too_small_minority() {
        // one positive: the test partition would get round(0.2) = 0 of it
        let (x, _) = labeled_frame(20, 2);
        let mut y = vec![0; 20];
        y[3] = 1;
        let err = split(&x, &y, 0.2, 42).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }
}
