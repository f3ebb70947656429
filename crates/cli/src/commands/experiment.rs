//! Training and prediction commands.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use sentistock_core::AppConfig;
use sentistock_experiment::ReportFormatter;
use sentistock_pipeline::DailyCycle;

/// Arguments for the train command.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Snapshot date to train on (YYYY-MM-DD); defaults to the newest snapshot
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the predict command.
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Snapshot date to predict from (YYYY-MM-DD); defaults to the newest snapshot
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Runs the experiment grid and prints the ranked results.
///
/// # Errors
/// Returns an error if the snapshot cannot be loaded or outputs cannot be written.
pub async fn run_train(config: AppConfig, args: TrainArgs) -> Result<()> {
    let cycle = DailyCycle::from_config(config);
    let key = cycle.resolve_key(args.date)?;
    let report = cycle.train(key).await?;
    print!("{}", ReportFormatter::experiments(&report));
    Ok(())
}

/// Scores the live window with every persisted model.
///
/// # Errors
/// Returns an error if the snapshot cannot be loaded or the report cannot be written.
pub fn run_predict(config: AppConfig, args: PredictArgs) -> Result<()> {
    let cycle = DailyCycle::from_config(config);
    let key = cycle.resolve_key(args.date)?;
    let report = cycle.predict(key)?;
    print!("{}", ReportFormatter::predictions(&report));
    Ok(())
}
