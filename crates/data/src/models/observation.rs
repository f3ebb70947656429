//! Observation rows and the date-keyed table they form.
//!
//! A table holds one row per calendar date in ascending order. Weekend and
//! holiday rows carry `NaN` prices until forward-filled. The `label` of a row
//! says whether the following row closed higher; the last row has none.

use chrono::NaiveDate;
use sentistock_core::FeatureColumn;
use serde::{Deserialize, Serialize};

/// One calendar date's merged sentiment and price record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRow {
    pub date: NaiveDate,
    pub news_count: u32,
    pub avg_negative: f64,
    pub avg_neutral: f64,
    pub avg_positive: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// 1 if the next row closed higher, 0 otherwise; `None` on the last row.
    pub label: Option<u8>,
}

impl ObservationRow {
    /// Returns the value of a feature column as `f64`.
    #[must_use]
    pub fn feature(&self, column: FeatureColumn) -> f64 {
        match column {
            FeatureColumn::NewsCount => f64::from(self.news_count),
            FeatureColumn::AvgNegative => self.avg_negative,
            FeatureColumn::AvgNeutral => self.avg_neutral,
            FeatureColumn::AvgPositive => self.avg_positive,
            FeatureColumn::Open => self.open,
            FeatureColumn::High => self.high,
            FeatureColumn::Low => self.low,
            FeatureColumn::Close => self.close,
            FeatureColumn::Volume => self.volume,
        }
    }

    fn price_mut(&mut self, column: FeatureColumn) -> Option<&mut f64> {
        match column {
            FeatureColumn::Open => Some(&mut self.open),
            FeatureColumn::High => Some(&mut self.high),
            FeatureColumn::Low => Some(&mut self.low),
            FeatureColumn::Close => Some(&mut self.close),
            FeatureColumn::Volume => Some(&mut self.volume),
            _ => None,
        }
    }

    /// Returns true if every price field is missing.
    #[must_use]
    pub fn is_non_trading(&self) -> bool {
        FeatureColumn::PRICE
            .iter()
            .all(|c| self.feature(*c).is_nan())
    }
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

// NaN marks a non-trading day, so two missing cells compare equal.
impl PartialEq for ObservationRow {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
            && self.news_count == other.news_count
            && self.label == other.label
            && FeatureColumn::ALL
                .iter()
                .all(|c| same_value(self.feature(*c), other.feature(*c)))
    }
}

/// The full observation history, ordered by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    rows: Vec<ObservationRow>,
}

impl ObservationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps rows as they are; callers that need ordering use [`Self::sort_by_date`].
    #[must_use]
    pub fn from_rows(rows: Vec<ObservationRow>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[ObservationRow] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<ObservationRow> {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ObservationRow> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn last(&self) -> Option<&ObservationRow> {
        self.rows.last()
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    /// Latest date in the table, regardless of row order.
    #[must_use]
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    /// Returns true if the trailing row is still waiting for its label.
    #[must_use]
    pub fn has_pending_label(&self) -> bool {
        self.rows.last().is_some_and(|r| r.label.is_none())
    }

    /// Returns true if dates are strictly increasing (no duplicates).
    #[must_use]
    pub fn is_strictly_increasing(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].date < w[1].date)
    }

    /// Number of calendar days missing between consecutive rows.
    #[must_use]
    pub fn calendar_gaps(&self) -> i64 {
        self.rows
            .windows(2)
            .map(|w| ((w[1].date - w[0].date).num_days() - 1).max(0))
            .sum()
    }

    /// Values of one column, in row order.
    #[must_use]
    pub fn column(&self, column: FeatureColumn) -> Vec<f64> {
        self.rows.iter().map(|r| r.feature(column)).collect()
    }

    #[must_use]
    pub fn labels(&self) -> Vec<Option<u8>> {
        self.rows.iter().map(|r| r.label).collect()
    }

    pub(crate) fn push(&mut self, row: ObservationRow) {
        self.rows.push(row);
    }

    /// Sorts rows by ascending date. The sort is stable.
    pub fn sort_by_date(&mut self) {
        self.rows.sort_by_key(|r| r.date);
    }

    /// Carries each price column's last known value forward over `NaN` cells.
    ///
    /// Leading `NaN`s with no earlier value are left untouched. Returns the
    /// number of cells filled.
    pub fn forward_fill_prices(&mut self) -> usize {
        let mut filled = 0;
        for column in FeatureColumn::PRICE {
            let mut last_known: Option<f64> = None;
            for row in &mut self.rows {
                let Some(cell) = row.price_mut(column) else {
                    continue;
                };
                if cell.is_nan() {
                    if let Some(value) = last_known {
                        *cell = value;
                        filled += 1;
                    }
                } else {
                    last_known = Some(*cell);
                }
            }
        }
        filled
    }

    /// Recomputes every label from consecutive closes; the last row gets none.
    ///
    /// A comparison involving `NaN` yields 0.
    pub fn recompute_labels(&mut self) {
        let closes = self.column(FeatureColumn::Close);
        let last = self.rows.len().saturating_sub(1);
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.label = if i < last {
                Some(u8::from(closes[i + 1] > closes[i]))
            } else {
                None
            };
        }
    }
}
