use crate::models::{Confidence, PredictionResult};

/// Decimal places kept in the reported probability
pub const PROBABILITY_DECIMALS: usize = 4;

/// Turn a hard label and its raw probability into the serving response.
///
/// Confidence and recommendation are computed from the unrounded probability;
/// only the reported `probability` field is rounded.
pub fn decide(label: bool, probability: f64) -> PredictionResult {
    PredictionResult {
        enrolled: label,
        probability: round_probability(probability),
        confidence: confidence_for(probability),
        recommendation: recommendation_for(label, probability).to_string(),
    }
}

/// Tiers are checked high first, so 0.8 and 0.2 are never medium
pub fn confidence_for(p: f64) -> Confidence {
    if p >= 0.8 || p <= 0.2 {
        Confidence::High
    } else if p >= 0.6 || p <= 0.4 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

pub fn recommendation_for(label: bool, p: f64) -> &'static str {
    if label {
        if p >= 0.8 {
            "Strong candidate for enrollment. Prioritize for outreach."
        } else if p >= 0.6 {
            "Likely to enroll. Consider targeted communication."
        } else {
            "May enroll with proper incentives. Follow up recommended."
        }
    } else if p <= 0.2 {
        "Unlikely to enroll. Minimal outreach recommended."
    } else if p <= 0.4 {
        "Low probability. Consider for broader campaigns only."
    } else {
        "Uncertain. May benefit from personalized approach."
    }
}

/// Round to `PROBABILITY_DECIMALS` places using the exact decimal value of `p`.
///
/// Formatting rounds the exact binary expansion, so 0.61115 (stored just below
/// the half point) goes down, and exact ties go to the even digit.
pub fn round_probability(p: f64) -> f64 {
    format!("{:.*}", PROBABILITY_DECIMALS, p)
        .parse()
        .unwrap_or(p)
}
