//! Sliding-window feature construction.
//!
//! A window of width `W` is `W` consecutive table rows, flattened row-major
//! over the selected feature columns. Weekend and holiday rows count toward
//! `W` like any other row.
//!
//! - [`training_matrix`] turns the whole table into supervised examples.
//! - [`live_vector`] flattens the most recent window for a same-day prediction.

pub mod error;
pub mod live;
pub mod training;
pub mod window;

pub use error::WindowError;
pub use live::{live_vector, LiveVector};
pub use training::{candidate_count, training_matrix, TrainingExample, TrainingMatrix};
pub use window::WindowSpec;
