//! CLI commands for the sentiment stock pipeline.

pub mod cycle;
pub mod experiment;
pub mod status;
pub mod update;

pub use cycle::{run_cycle, run_schedule, RunArgs};
pub use experiment::{run_predict, run_train, PredictArgs, TrainArgs};
pub use status::run_status;
pub use update::{run_backfill, run_update, BackfillArgs, UpdateArgs};

use chrono::{Local, NaiveDate};

/// The given date, or today in local time.
pub(crate) fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}
