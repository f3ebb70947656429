//! Observation data for the sentiment stock pipeline.
//!
//! This crate provides:
//! - Observation row and table models
//! - The row normalizer joining sentiment and price observations
//! - The merge engine maintaining forward-filled prices and labels
//! - The single-generation snapshot store

pub mod error;
pub mod merge;
pub mod models;
pub mod normalizer;
pub mod store;

pub use error::DataError;
pub use merge::{merge, merge_batch};
pub use models::{ObservationRow, ObservationTable, SentimentObservation};
pub use normalizer::normalize;
pub use store::{CsvSnapshotStore, SnapshotKey, SnapshotStore, StoreLock};
