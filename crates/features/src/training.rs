//! Supervised training matrix construction.

use crate::error::WindowError;
use crate::window::WindowSpec;
use chrono::NaiveDate;
use sentistock_data::ObservationTable;
use std::collections::BTreeSet;
use tracing::debug;

/// Number of candidate windows in a table of `rows` rows before filtering.
#[must_use]
pub fn candidate_count(rows: usize, width: usize) -> usize {
    rows.saturating_sub(width)
}

/// One flattened window and the label of the row right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub features: Vec<f64>,
    pub label: u8,
    /// Date of the row whose label is the target.
    pub target_date: NaiveDate,
}

/// Training examples in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingMatrix {
    width: usize,
    feature_len: usize,
    examples: Vec<TrainingExample>,
    candidates: usize,
}

impl TrainingMatrix {
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn feature_len(&self) -> usize {
        self.feature_len
    }

    #[must_use]
    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Candidate windows considered, including the ones that were dropped.
    #[must_use]
    pub fn candidates(&self) -> usize {
        self.candidates
    }

    /// Candidates dropped for an undefined label or a missing feature.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.candidates - self.examples.len()
    }

    /// Feature rows.
    #[must_use]
    pub fn x(&self) -> Vec<Vec<f64>> {
        self.examples.iter().map(|e| e.features.clone()).collect()
    }

    /// Labels.
    #[must_use]
    pub fn y(&self) -> Vec<u8> {
        self.examples.iter().map(|e| e.label).collect()
    }

    /// Time-ordered split: the first `floor(len * train_fraction)` examples
    /// train, the rest test. No shuffling.
    #[must_use]
    pub fn split(&self, train_fraction: f64) -> (&[TrainingExample], &[TrainingExample]) {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let cut = ((self.examples.len() as f64) * train_fraction.clamp(0.0, 1.0)).floor() as usize;
        self.examples.split_at(cut.min(self.examples.len()))
    }
}

/// Builds one example per index `i` in `W..N`: the flattened rows `[i-W, i)`
/// with the label of row `i`.
///
/// Candidates whose target label is undefined (the trailing row) or whose
/// window holds a `NaN` in a selected column are dropped.
///
/// # Errors
/// - [`WindowError::InsufficientHistory`] when the table has `W` rows or fewer.
/// - [`WindowError::DegenerateLabels`] when the surviving labels hold fewer
///   than two classes. Both are skip outcomes, see [`WindowError::is_skip`].
pub fn training_matrix(
    table: &ObservationTable,
    spec: &WindowSpec,
) -> Result<TrainingMatrix, WindowError> {
    let rows = table.rows();
    let width = spec.width();
    if rows.len() <= width {
        return Err(WindowError::InsufficientHistory {
            width,
            rows: rows.len(),
        });
    }

    let candidates = candidate_count(rows.len(), width);
    let mut examples = Vec::with_capacity(candidates);
    for i in width..rows.len() {
        let Some(label) = rows[i].label else {
            continue;
        };
        match spec.flatten(&rows[i - width..i]) {
            Ok(features) => examples.push(TrainingExample {
                features,
                label,
                target_date: rows[i].date,
            }),
            Err(WindowError::MissingFeature { date, column }) => {
                debug!(target = %rows[i].date, %date, %column, "Skipping window with missing feature");
            }
            Err(e) => return Err(e),
        }
    }

    let distinct: BTreeSet<u8> = examples.iter().map(|e| e.label).collect();
    if distinct.len() < 2 {
        return Err(WindowError::DegenerateLabels {
            examples: examples.len(),
            distinct: distinct.len(),
        });
    }

    debug!(
        width,
        candidates,
        examples = examples.len(),
        "Built training matrix"
    );

    Ok(TrainingMatrix {
        width,
        feature_len: spec.feature_len(),
        examples,
        candidates,
    })
}
