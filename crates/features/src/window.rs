use crate::error::WindowError;
use sentistock_core::FeatureColumn;
use sentistock_data::ObservationRow;
use serde::{Deserialize, Serialize};

/// Window width plus the ordered feature columns flattened from each row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    width: usize,
    columns: Vec<FeatureColumn>,
}

impl WindowSpec {
    /// # Errors
    /// Returns [`WindowError::InvalidWindow`] for a zero width or no columns.
    pub fn new(width: usize, columns: Vec<FeatureColumn>) -> Result<Self, WindowError> {
        if width == 0 || columns.is_empty() {
            return Err(WindowError::InvalidWindow {
                width,
                columns: columns.len(),
            });
        }
        Ok(Self { width, columns })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Length of a flattened vector: `width * columns`.
    #[must_use]
    pub fn feature_len(&self) -> usize {
        self.width * self.columns.len()
    }

    /// Flattens `rows` row-major over the configured columns.
    ///
    /// # Errors
    /// Returns [`WindowError::MissingFeature`] for the first `NaN` cell.
    pub fn flatten(&self, rows: &[ObservationRow]) -> Result<Vec<f64>, WindowError> {
        let mut features = Vec::with_capacity(rows.len() * self.columns.len());
        for row in rows {
            for column in &self.columns {
                let value = row.feature(*column);
                if value.is_nan() {
                    return Err(WindowError::MissingFeature {
                        date: row.date,
                        column: *column,
                    });
                }
                features.push(value);
            }
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::row;

    #[test]
    fn rejects_zero_width_and_empty_columns() {
        assert!(WindowSpec::new(0, vec![FeatureColumn::Close]).is_err());
        assert!(WindowSpec::new(5, vec![]).is_err());
    }

    #[test]
    fn flatten_is_row_major_in_declared_column_order() {
        let spec = WindowSpec::new(2, vec![FeatureColumn::Close, FeatureColumn::NewsCount]).unwrap();
        let rows = vec![row(0, 100.0), row(1, 101.0)];
        assert_eq!(spec.flatten(&rows).unwrap(), vec![100.0, 3.0, 101.0, 3.0]);
        assert_eq!(spec.feature_len(), 4);
    }

    #[test]
    fn flatten_reports_first_missing_cell() {
        let spec = WindowSpec::new(2, vec![FeatureColumn::NewsCount, FeatureColumn::Open]).unwrap();
        let rows = vec![row(0, 100.0), row(1, f64::NAN)];
        match spec.flatten(&rows).unwrap_err() {
            WindowError::MissingFeature { date, column } => {
                assert_eq!(date, rows[1].date);
                assert_eq!(column, FeatureColumn::Open);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unused_missing_columns_do_not_matter() {
        let spec = WindowSpec::new(1, vec![FeatureColumn::AvgPositive]).unwrap();
        assert!(spec.flatten(&[row(0, f64::NAN)]).is_ok());
    }
}
