use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Tolerance for the three sentiment probabilities summing to one.
pub const SCORE_SUM_TOLERANCE: f64 = 1e-3;

/// A collected news article for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub date: NaiveDate,
    pub headline: String,
}

impl Article {
    pub fn new(date: NaiveDate, headline: impl Into<String>) -> Self {
        Self {
            date,
            headline: headline.into(),
        }
    }

    /// Returns true if the headline carries text worth scoring.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.headline.trim().is_empty()
    }
}

/// 3-way sentiment probabilities for a single headline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl SentimentScore {
    #[must_use]
    pub fn new(negative: f64, neutral: f64, positive: f64) -> Self {
        Self {
            negative,
            neutral,
            positive,
        }
    }

    /// Score assigned to a day without any scored headline.
    #[must_use]
    pub fn all_neutral() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Returns true if every probability is in [0, 1] and they sum to ~1.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let parts = [self.negative, self.neutral, self.positive];
        parts.iter().all(|p| (0.0..=1.0).contains(p))
            && (parts.iter().sum::<f64>() - 1.0).abs() <= SCORE_SUM_TOLERANCE
    }
}

/// OHLCV quote for one date. Non-trading days carry `NaN` in every field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceQuote {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceQuote {
    #[must_use]
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// The all-missing marker for weekends and market holidays.
    #[must_use]
    pub fn missing(date: NaiveDate) -> Self {
        Self::new(date, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_nan())
    }
}

/// Returns true for Saturday and Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
