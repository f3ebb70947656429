//! Live feature vector for a same-day prediction.

use crate::error::WindowError;
use crate::window::WindowSpec;
use chrono::NaiveDate;
use sentistock_data::ObservationTable;

/// The most recent window, flattened exactly like a training example.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveVector {
    /// Date of the last row in the window ("today").
    pub date: NaiveDate,
    pub width: usize,
    pub features: Vec<f64>,
}

/// Flattens the last `W` rows of `table`.
///
/// The last row is normally today's, still unlabeled. Its label is never a
/// feature, only its selected columns are.
///
/// # Errors
/// - [`WindowError::InsufficientHistory`] with fewer than `W` rows.
/// - [`WindowError::MissingFeature`] if a selected cell is `NaN`.
pub fn live_vector(table: &ObservationTable, spec: &WindowSpec) -> Result<LiveVector, WindowError> {
    let rows = table.rows();
    let width = spec.width();
    if rows.len() < width {
        return Err(WindowError::InsufficientHistory {
            width,
            rows: rows.len(),
        });
    }

    let window = &rows[rows.len() - width..];
    let features = spec.flatten(window)?;
    let date = window
        .last()
        .map(|r| r.date)
        .ok_or(WindowError::InsufficientHistory { width, rows: 0 })?;

    Ok(LiveVector {
        date,
        width,
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, table};
    use crate::training::training_matrix;
    use sentistock_core::FeatureColumn;

    #[test]
    fn exact_width_table_yields_full_vector() {
        let t = table(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let spec = WindowSpec::new(5, FeatureColumn::ALL.to_vec()).unwrap();
        let live = live_vector(&t, &spec).unwrap();
        assert_eq!(live.features.len(), 45);
        assert_eq!(live.date, date(4));
    }

    #[test]
    fn short_table_is_insufficient() {
        let t = table(&[100.0, 101.0, 102.0, 103.0]);
        let spec = WindowSpec::new(5, FeatureColumn::ALL.to_vec()).unwrap();
        assert_eq!(
            live_vector(&t, &spec).unwrap_err(),
            WindowError::InsufficientHistory { width: 5, rows: 4 }
        );
    }

    #[test]
    fn includes_todays_unlabeled_row() {
        let t = table(&[100.0, 101.0, 102.0, 99.0]);
        assert!(t.has_pending_label());
        let spec = WindowSpec::new(2, vec![FeatureColumn::Close]).unwrap();
        let live = live_vector(&t, &spec).unwrap();
        assert_eq!(live.features, vec![102.0, 99.0]);
    }

    #[test]
    fn missing_cell_is_an_error() {
        let t = table(&[f64::NAN, 101.0]);
        let spec = WindowSpec::new(2, vec![FeatureColumn::Close]).unwrap();
        assert!(matches!(
            live_vector(&t, &spec),
            Err(WindowError::MissingFeature { column: FeatureColumn::Close, .. })
        ));
    }

    #[test]
    fn shape_matches_training_examples() {
        let t = table(&[100.0, 102.0, 101.0, 103.0, 104.0, 104.0, 106.0, 105.0]);
        let spec = WindowSpec::new(3, FeatureColumn::ALL.to_vec()).unwrap();
        let m = training_matrix(&t, &spec).unwrap();
        let live = live_vector(&t, &spec).unwrap();
        assert_eq!(live.features.len(), m.feature_len());
        assert_eq!(live.features.len(), m.examples()[0].features.len());
    }
}
