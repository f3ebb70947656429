use chrono::NaiveDate;
use sentistock_core::FeatureColumn;
use thiserror::Error;

/// Errors from window construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    /// Fewer rows than the window width.
    #[error("insufficient history: window of {width} rows but only {rows} available")]
    InsufficientHistory { width: usize, rows: usize },

    /// A selected cell is missing.
    #[error("missing feature {column} on {date}")]
    MissingFeature { date: NaiveDate, column: FeatureColumn },

    /// The usable labels contain fewer than two classes.
    #[error("degenerate labels: {examples} usable examples with {distinct} distinct label value(s)")]
    DegenerateLabels { examples: usize, distinct: usize },

    /// Window width of zero or an empty column list.
    #[error("invalid window: width {width} with {columns} feature column(s)")]
    InvalidWindow { width: usize, columns: usize },
}

impl WindowError {
    /// Returns true for outcomes that mean "skip this combination" rather than failure.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            WindowError::DegenerateLabels { .. } | WindowError::InsufficientHistory { .. }
        )
    }
}
