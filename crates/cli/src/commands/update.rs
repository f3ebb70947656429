//! Daily update and backfill commands.

use super::date_or_today;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use sentistock_core::AppConfig;
use sentistock_pipeline::{DailyCycle, UpdateSummary};

/// Arguments for the update command.
#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Date to collect (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the backfill command.
#[derive(Args, Debug, Clone)]
pub struct BackfillArgs {
    /// First date to collect (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last date to collect, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,
}

fn print_summary(summary: &UpdateSummary) {
    println!(
        "{}  snapshot {}  rows={}  news={} (scored {}){}{}",
        summary.date,
        summary.key,
        summary.rows,
        summary.news_count,
        summary.scored,
        if summary.non_trading { "  non-trading" } else { "" },
        if summary.first_run { "  new history" } else { "" },
    );
}

/// Runs one daily update.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn run_update(config: AppConfig, args: UpdateArgs) -> Result<()> {
    let cycle = DailyCycle::from_config(config);
    let summary = cycle.daily_update()?.run(date_or_today(args.date)).await?;
    print_summary(&summary);
    Ok(())
}

/// Runs the update for every day in the range.
///
/// # Errors
/// Returns an error at the first failing day.
pub async fn run_backfill(config: AppConfig, args: BackfillArgs) -> Result<()> {
    let cycle = DailyCycle::from_config(config);
    let summaries = cycle.daily_update()?.backfill(args.from, args.to).await?;
    for summary in &summaries {
        print_summary(summary);
    }
    println!("Backfilled {} days", summaries.len());
    Ok(())
}
