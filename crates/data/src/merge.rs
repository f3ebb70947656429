//! Merge engine: appends new observations to the stored history.
//!
//! Every merge re-derives forward-filled prices and all labels from the whole
//! table, so a value filled in today corrects the labels of earlier rows.

use crate::error::DataError;
use crate::models::{ObservationRow, ObservationTable};
use tracing::{debug, warn};

/// Appends one row to `previous` and rebuilds fills and labels.
///
/// # Errors
/// Returns [`DataError::Scope`] if `row` is not strictly newer than every
/// stored date.
pub fn merge(previous: ObservationTable, row: ObservationRow) -> Result<ObservationTable, DataError> {
    merge_batch(previous, vec![row])
}

/// Appends several rows at once; they may arrive in any order but must all be
/// newer than the stored history and distinct from each other.
///
/// # Errors
/// Returns [`DataError::Scope`] on a duplicate or out-of-order date.
pub fn merge_batch(
    previous: ObservationTable,
    mut rows: Vec<ObservationRow>,
) -> Result<ObservationTable, DataError> {
    rows.sort_by_key(|r| r.date);

    let mut latest = previous.max_date();
    for row in &rows {
        if let Some(latest) = latest {
            if row.date <= latest {
                return Err(DataError::Scope {
                    incoming: row.date,
                    latest,
                });
            }
            let gap = (row.date - latest).num_days() - 1;
            if gap > 0 {
                warn!(
                    incoming = %row.date,
                    latest = %latest,
                    missing_days = gap,
                    "Merging across a calendar gap"
                );
            }
        }
        latest = Some(row.date);
    }

    let appended = rows.len();
    let mut table = previous;
    for row in rows {
        table.push(row);
    }
    table.sort_by_date();
    let filled = table.forward_fill_prices();
    table.recompute_labels();

    debug!(
        appended,
        rows = table.len(),
        filled,
        "Merged observations"
    );

    Ok(table)
}
