//! Full cycle and scheduler commands.

use super::date_or_today;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use sentistock_core::AppConfig;
use sentistock_experiment::ReportFormatter;
use sentistock_pipeline::{DailyCycle, DailyScheduler};

/// Arguments for the run command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Date to run (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Update, train and predict once.
///
/// # Errors
/// Returns an error if any step fails.
pub async fn run_cycle(config: AppConfig, args: RunArgs) -> Result<()> {
    let scheduler = DailyScheduler::new(DailyCycle::from_config(config));
    let summary = scheduler.run_once(date_or_today(args.date)).await?;
    print!("{}", ReportFormatter::experiments(&summary.experiments));
    print!("{}", ReportFormatter::predictions(&summary.predictions));
    Ok(())
}

/// Runs the daily cycle on the configured cron schedule until interrupted.
///
/// # Errors
/// Returns an error if the scheduler cannot start.
pub async fn run_schedule(config: AppConfig) -> Result<()> {
    DailyScheduler::new(DailyCycle::from_config(config))
        .start()
        .await
}
