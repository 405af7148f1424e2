//! Common test utilities
//!
//! Deterministic synthetic employee datasets and a shared trained model.

#![allow(dead_code)]

use enrollment_predictor::{
    ml::{train, EnrollmentModel, Frame, Metrics, TrainingConfig},
    models::{
        EmployeeRecord, EmploymentType, Gender, HasDependents, MaritalStatus, Region,
        FEATURE_NAMES, TARGET_NAME,
    },
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::OnceLock;
use strum::IntoEnumIterator;

/// The example record used throughout the API documentation
pub fn example_employee() -> EmployeeRecord {
    EmployeeRecord {
        age: 35,
        gender: Gender::Male,
        marital_status: MaritalStatus::Married,
        salary: 75000.0,
        employment_type: EmploymentType::FullTime,
        region: Region::West,
        has_dependents: HasDependents::Yes,
        tenure_years: 5.5,
    }
}

fn pick<T: IntoEnumIterator + Copy>(rng: &mut StdRng) -> T {
    let values: Vec<T> = T::iter().collect();
    *values.choose(rng).expect("enum has variants")
}

/// Random employee plus an enrollment label drawn from a salary/dependents driven logit
pub fn synthetic_employee(rng: &mut StdRng) -> (EmployeeRecord, bool) {
    let record = EmployeeRecord {
        age: rng.gen_range(18..=70),
        gender: pick(rng),
        marital_status: pick(rng),
        salary: (rng.gen_range(30_000.0..120_000.0_f64) * 100.0).round() / 100.0,
        employment_type: pick(rng),
        region: pick(rng),
        has_dependents: pick(rng),
        tenure_years: (rng.gen_range(0.0..20.0_f64) * 10.0).round() / 10.0,
    };

    let mut z = (record.salary - 70_000.0) / 12_000.0;
    if record.has_dependents == HasDependents::Yes {
        z += 1.5;
    }
    z += match record.employment_type {
        EmploymentType::FullTime => 0.8,
        EmploymentType::PartTime => -0.4,
        EmploymentType::Contract => -1.2,
    };
    let p = 1.0 / (1.0 + (-z).exp());
    let enrolled = rng.gen::<f64>() < p;

    (record, enrolled)
}

/// CSV text with a header row; every `missing_every`-th row has empty tenure and region
pub fn dataset_csv(n: usize, seed: u64, missing_every: Option<usize>) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = FEATURE_NAMES.join(",");
    out.push(',');
    out.push_str(TARGET_NAME);
    out.push('\n');

    for i in 0..n {
        let (r, enrolled) = synthetic_employee(&mut rng);
        let blank = missing_every.map_or(false, |k| i % k == k - 1);
        let region = if blank { String::new() } else { r.region.to_string() };
        let tenure = if blank {
            String::new()
        } else {
            r.tenure_years.to_string()
        };
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            r.age,
            r.gender,
            r.marital_status,
            r.salary,
            r.employment_type,
            region,
            r.has_dependents,
            tenure,
            u8::from(enrolled)
        ));
    }
    out
}

pub fn synthetic_frame(n: usize, seed: u64) -> Frame {
    Frame::from_csv_reader(dataset_csv(n, seed, None).as_bytes())
        .expect("synthetic dataset parses")
}

pub fn write_dataset(path: &Path, n: usize, seed: u64) {
    std::fs::write(path, dataset_csv(n, seed, Some(25))).expect("write dataset");
}

/// Model trained once per test binary on 400 synthetic rows
pub fn trained_model() -> (EnrollmentModel, Metrics) {
    static MODEL: OnceLock<(EnrollmentModel, Metrics)> = OnceLock::new();
    MODEL
        .get_or_init(|| {
            train(&synthetic_frame(400, 7), &TrainingConfig::default()).expect("training succeeds")
        })
        .clone()
}
