//! Experiment and prediction drivers.
//!
//! [`TrainingDriver`] evaluates every (model, window, parameter set)
//! combination on a worker pool and persists the best fitted model per
//! (model, window). [`PredictionDriver`] loads those artifacts and scores the
//! live window ending on the newest row.

pub mod combination;
pub mod formatter;
pub mod prediction;
pub mod report;
pub mod training;

pub use combination::{enumerate_combinations, Combination};
pub use formatter::ReportFormatter;
pub use prediction::{PredictionDriver, PredictionOutcome, PredictionReport, PredictionStatus};
pub use report::{ExperimentRecord, ExperimentReport, SkippedCombination};
pub use training::{worker_count, TrainingDriver};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use sentistock_data::{merge_batch, ObservationRow, ObservationTable};

    pub fn date(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    /// A table whose closes zig-zag with a slow upward drift, so both labels
    /// occur throughout. Sentiment leans positive before a rise.
    pub fn zigzag_table(rows: usize) -> ObservationTable {
        let closes: Vec<f64> = (0..rows)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64;
                100.0 + 0.1 * t + if i % 3 == 0 { 2.0 } else { 0.0 }
            })
            .collect();
        let rows = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let rising = closes.get(i + 1).is_some_and(|next| *next > close);
                ObservationRow {
                    date: date(i as i64),
                    news_count: 4,
                    avg_negative: if rising { 0.1 } else { 0.5 },
                    avg_neutral: 0.3,
                    avg_positive: if rising { 0.6 } else { 0.2 },
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000.0 + (i % 7) as f64,
                    label: None,
                }
            })
            .collect();
        merge_batch(ObservationTable::new(), rows).unwrap()
    }
}
