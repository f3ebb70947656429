//! Column schema of the observation table.
//!
//! The table has a fixed layout; feature selection for windowing is expressed
//! as an ordered list of [`FeatureColumn`]s.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A numeric column usable as a model feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    NewsCount,
    AvgNegative,
    AvgNeutral,
    AvgPositive,
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl FeatureColumn {
    /// All feature columns in canonical table order.
    pub const ALL: [FeatureColumn; 9] = [
        FeatureColumn::NewsCount,
        FeatureColumn::AvgNegative,
        FeatureColumn::AvgNeutral,
        FeatureColumn::AvgPositive,
        FeatureColumn::Open,
        FeatureColumn::High,
        FeatureColumn::Low,
        FeatureColumn::Close,
        FeatureColumn::Volume,
    ];

    /// Price columns that are forward-filled across non-trading days.
    pub const PRICE: [FeatureColumn; 5] = [
        FeatureColumn::Open,
        FeatureColumn::High,
        FeatureColumn::Low,
        FeatureColumn::Close,
        FeatureColumn::Volume,
    ];

    /// Returns the column name used in snapshot headers and config files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureColumn::NewsCount => "news_count",
            FeatureColumn::AvgNegative => "avg_negative",
            FeatureColumn::AvgNeutral => "avg_neutral",
            FeatureColumn::AvgPositive => "avg_positive",
            FeatureColumn::Open => "open",
            FeatureColumn::High => "high",
            FeatureColumn::Low => "low",
            FeatureColumn::Close => "close",
            FeatureColumn::Volume => "volume",
        }
    }

    /// Returns true for OHLCV columns.
    #[must_use]
    pub fn is_price(&self) -> bool {
        Self::PRICE.contains(self)
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureColumn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureColumn::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("Unknown feature column: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_table_layout() {
        let names: Vec<&str> = FeatureColumn::ALL.iter().map(FeatureColumn::as_str).collect();
        assert_eq!(
            names,
            vec![
                "news_count",
                "avg_negative",
                "avg_neutral",
                "avg_positive",
                "open",
                "high",
                "low",
                "close",
                "volume"
            ]
        );
    }

    #[test]
    fn parse_round_trips_names() {
        for column in FeatureColumn::ALL {
            assert_eq!(column.as_str().parse::<FeatureColumn>().unwrap(), column);
        }
        assert!("adj_close".parse::<FeatureColumn>().is_err());
    }

    #[test]
    fn price_columns_are_flagged() {
        assert!(FeatureColumn::Close.is_price());
        assert!(FeatureColumn::Volume.is_price());
        assert!(!FeatureColumn::NewsCount.is_price());
        assert!(!FeatureColumn::AvgPositive.is_price());
    }
}
