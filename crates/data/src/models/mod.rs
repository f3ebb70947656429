//! Data models for the observation pipeline.
//!
//! Price fields are `f64` so that non-trading days can carry `NaN`.

pub mod observation;
pub mod sentiment;

pub use observation::{ObservationRow, ObservationTable};
pub use sentiment::SentimentObservation;
