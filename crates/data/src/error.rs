use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from normalization, merging, and snapshot storage.
#[derive(Error, Debug)]
pub enum DataError {
    /// Sentiment and price observations describe different dates.
    #[error("schema mismatch: sentiment dated {sentiment} but price dated {price}")]
    Schema {
        sentiment: NaiveDate,
        price: NaiveDate,
    },

    /// No snapshot is stored under the requested key.
    #[error("snapshot {key} not found at {}", path.display())]
    NotFound { key: String, path: PathBuf },

    /// An incoming row does not come after every stored date.
    #[error("row dated {incoming} is not after the latest stored date {latest}")]
    Scope {
        incoming: NaiveDate,
        latest: NaiveDate,
    },

    /// A committed snapshot did not read back identical to what was written.
    #[error("snapshot {key} failed verification: {reason}")]
    Verification { key: String, reason: String },

    /// Another run holds the store lock.
    #[error("store at {} is locked by another run", path.display())]
    Locked { path: PathBuf },

    /// IO error reading/writing a snapshot.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding/decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
