//! Row normalizer: joins a day's sentiment and price into one observation row.

use crate::error::DataError;
use crate::models::{ObservationRow, SentimentObservation};
use sentistock_core::PriceQuote;

/// Builds the canonical observation row for one date.
///
/// The row's label is left undefined; labels are assigned by the merge.
///
/// # Errors
/// Returns [`DataError::Schema`] if the two inputs carry different dates.
pub fn normalize(
    sentiment: &SentimentObservation,
    price: &PriceQuote,
) -> Result<ObservationRow, DataError> {
    if sentiment.date != price.date {
        return Err(DataError::Schema {
            sentiment: sentiment.date,
            price: price.date,
        });
    }

    Ok(ObservationRow {
        date: sentiment.date,
        news_count: sentiment.news_count,
        avg_negative: sentiment.avg_negative,
        avg_neutral: sentiment.avg_neutral,
        avg_positive: sentiment.avg_positive,
        open: price.open,
        high: price.high,
        low: price.low,
        close: price.close,
        volume: price.volume,
        label: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sentistock_core::SentimentScore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn joins_sentiment_and_price() {
        let sentiment =
            SentimentObservation::from_scores(day(7), 1, &[SentimentScore::new(0.1, 0.2, 0.7)]);
        let price = PriceQuote::new(day(7), 55_000.0, 56_000.0, 54_500.0, 55_800.0, 12_345_678.0);

        let row = normalize(&sentiment, &price).unwrap();

        assert_eq!(row.date, day(7));
        assert_eq!(row.news_count, 1);
        assert!((row.avg_positive - 0.7).abs() < 1e-9);
        assert!((row.close - 55_800.0).abs() < f64::EPSILON);
        assert!(row.label.is_none());
    }

    #[test]
    fn keeps_missing_prices_as_nan() {
        let sentiment = SentimentObservation::from_scores(day(3), 0, &[]);
        let row = normalize(&sentiment, &PriceQuote::missing(day(3))).unwrap();
        assert!(row.is_non_trading());
        assert!((row.avg_neutral - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_mismatched_dates() {
        let sentiment = SentimentObservation::from_scores(day(7), 0, &[]);
        let err = normalize(&sentiment, &PriceQuote::missing(day(8))).unwrap_err();
        assert!(matches!(err, DataError::Schema { .. }));
    }
}
