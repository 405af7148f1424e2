use crate::error::{AppError, Result};
use crate::ml::models::Metrics;

/// Score held-out predictions.
///
/// Precision, recall and F1 fall back to 0.0 when their denominator is zero.
/// ROC-AUC is the Mann-Whitney statistic with tied scores sharing their
/// average rank, so it needs both classes present in `y_true`.
pub fn evaluate(y_true: &[usize], y_pred: &[usize], y_prob: &[f64]) -> Result<Metrics> {
    if y_true.len() != y_pred.len() || y_true.len() != y_prob.len() {
        return Err(AppError::Validation(format!(
            "evaluation inputs differ in length: y_true={}, y_pred={}, y_prob={}",
            y_true.len(),
            y_pred.len(),
            y_prob.len()
        )));
    }

    let positives = y_true.iter().filter(|&&y| y == 1).count();
    let negatives = y_true.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(AppError::DegenerateEvaluation(format!(
            "y_true contains a single class ({} positive, {} negative)",
            positives, negatives
        )));
    }

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    let mut correct = 0usize;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == 1, p == 1) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
        if (t == 1) == (p == 1) {
            correct += 1;
        }
    }

    let accuracy = correct as f64 / y_true.len() as f64;
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(Metrics {
        accuracy,
        precision,
        recall,
        f1,
        roc_auc: roc_auc(y_true, y_prob, positives, negatives),
    })
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn roc_auc(y_true: &[usize], y_prob: &[f64], positives: usize, negatives: usize) -> f64 {
    let mut order: Vec<usize> = (0..y_prob.len()).collect();
    order.sort_by(|&a, &b| y_prob[a].total_cmp(&y_prob[b]));

    // 1-based ranks, averaged across runs of equal scores
    let mut ranks = vec![0.0; y_prob.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && y_prob[order[end]] == y_prob[order[start]] {
            end += 1;
        }
        let average = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = average;
        }
        start = end;
    }

    let positive_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(&y, _)| y == 1)
        .map(|(_, &r)| r)
        .sum();

    let n_pos = positives as f64;
    let n_neg = negatives as f64;
    (positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
}
