//! Daily sentiment aggregate.

use chrono::NaiveDate;
use sentistock_core::SentimentScore;
use serde::{Deserialize, Serialize};

/// One day's averaged headline sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentObservation {
    pub date: NaiveDate,
    /// Number of articles collected for the day, scored or not.
    pub news_count: u32,
    pub avg_negative: f64,
    pub avg_neutral: f64,
    pub avg_positive: f64,
}

impl SentimentObservation {
    /// Averages per-headline scores into a daily observation.
    ///
    /// A day without any scored headline is treated as fully neutral.
    /// Averages are rounded to four decimals.
    #[must_use]
    pub fn from_scores(date: NaiveDate, news_count: u32, scores: &[SentimentScore]) -> Self {
        let avg = if scores.is_empty() {
            SentimentScore::all_neutral()
        } else {
            #[allow(clippy::cast_precision_loss)]
            let n = scores.len() as f64;
            SentimentScore::new(
                scores.iter().map(|s| s.negative).sum::<f64>() / n,
                scores.iter().map(|s| s.neutral).sum::<f64>() / n,
                scores.iter().map(|s| s.positive).sum::<f64>() / n,
            )
        };

        Self {
            date,
            news_count,
            avg_negative: round4(avg.negative),
            avg_neutral: round4(avg.neutral),
            avg_positive: round4(avg.positive),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
