//! Held-out evaluation metrics for binary predictions.

use serde::{Deserialize, Serialize};

/// Metrics over a held-out test tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub f1: f64,
    /// `None` when the test labels hold a single class.
    pub roc_auc: Option<f64>,
}

impl ClassificationMetrics {
    /// Evaluates probabilities against labels, classifying `proba > threshold`
    /// as the positive class.
    #[must_use]
    pub fn evaluate(y_true: &[u8], proba: &[f64], threshold: f64) -> Self {
        let predicted: Vec<u8> = proba.iter().map(|&p| u8::from(p > threshold)).collect();
        Self {
            accuracy: accuracy(y_true, &predicted),
            f1: f1_score(y_true, &predicted),
            roc_auc: roc_auc(y_true, proba),
        }
    }
}

/// Fraction of matching labels; 0 for empty input.
#[must_use]
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = correct as f64 / y_true.len() as f64;
    ratio
}

/// F1 of the positive class. 0 when there are no true positives.
#[must_use]
pub fn f1_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == 1, p == 1) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    if tp == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let f1 = 2.0 * tp as f64 / (2 * tp + fp + fn_) as f64;
    f1
}

/// Area under the ROC curve via the Mann-Whitney rank statistic, with tied
/// scores given their average rank.
///
/// Returns `None` unless both classes are present.
#[must_use]
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Option<f64> {
    let n = y_true.len().min(scores.len());
    let n_pos = y_true[..n].iter().filter(|&&t| t == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; ties share the mean of ranks i+1..=j+1
        #[allow(clippy::cast_precision_loss)]
        let avg_rank = (i + j + 2) as f64 / 2.0;
        for &k in &order[i..=j] {
            if y_true[k] == 1 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let (pos, neg) = (n_pos as f64, n_neg as f64);
    Some((rank_sum_pos - pos * (pos + 1.0) / 2.0) / (pos * neg))
}
