use crate::ml::dataset::{Frame, Value};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use validator::Validate;

/// Input feature names, in the order the serving layer expects them
pub const FEATURE_NAMES: [&str; 8] = [
    "age",
    "gender",
    "marital_status",
    "salary",
    "employment_type",
    "region",
    "has_dependents",
    "tenure_years",
];

/// Feature columns typed numeric; every other feature is categorical
pub const NUMERIC_FEATURE_NAMES: [&str; 3] = ["age", "salary", "tenure_years"];

/// Binary target column
pub const TARGET_NAME: &str = "enrolled";

/// One employee as submitted for prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmployeeRecord {
    /// Employee age (18-100)
    #[validate(range(min = 18, max = 100))]
    pub age: i64,

    pub gender: Gender,

    pub marital_status: MaritalStatus,

    /// Annual salary in USD
    #[validate(range(min = 0.0))]
    pub salary: f64,

    pub employment_type: EmploymentType,

    pub region: Region,

    pub has_dependents: HasDependents,

    /// Years of employment tenure
    #[validate(range(min = 0.0))]
    pub tenure_years: f64,
}

impl EmployeeRecord {
    /// Cells in `FEATURE_NAMES` order
    pub fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Number(self.age as f64),
            Value::Text(self.gender.to_string()),
            Value::Text(self.marital_status.to_string()),
            Value::Number(self.salary),
            Value::Text(self.employment_type.to_string()),
            Value::Text(self.region.to_string()),
            Value::Text(self.has_dependents.to_string()),
            Value::Number(self.tenure_years),
        ]
    }

    /// Build a feature frame from already validated records
    pub fn to_frame(records: &[EmployeeRecord]) -> Frame {
        let columns = FEATURE_NAMES.iter().map(|c| c.to_string()).collect();
        let rows = records.iter().map(EmployeeRecord::to_values).collect();
        Frame::new(columns, rows)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
pub enum EmploymentType {
    #[serde(rename = "Full-time")]
    #[strum(serialize = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    #[strum(serialize = "Part-time")]
    PartTime,
    Contract,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
pub enum Region {
    West,
    Midwest,
    Northeast,
    South,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
pub enum HasDependents {
    Yes,
    No,
}
