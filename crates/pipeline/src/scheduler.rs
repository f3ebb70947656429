use crate::cycle::{CycleSummary, DailyCycle};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Runs the daily cycle on a cron schedule.
pub struct DailyScheduler {
    cron: String,
    cycle: Arc<DailyCycle>,
}

impl DailyScheduler {
    #[must_use]
    pub fn new(cycle: DailyCycle) -> Self {
        Self {
            cron: cycle.config().schedule.cron.clone(),
            cycle: Arc::new(cycle),
        }
    }

    #[must_use]
    pub fn cron(&self) -> &str {
        &self.cron
    }

    /// Starts the scheduler and runs the cycle for the local date on every tick.
    ///
    /// A failed cycle is logged; the scheduler keeps running.
    ///
    /// # Errors
    /// Returns an error if the cron expression is invalid or the scheduler
    /// fails to start.
    pub async fn start(self) -> Result<()> {
        info!("Starting daily scheduler with cron: {}", self.cron);

        let scheduler = JobScheduler::new().await?;
        let cycle = self.cycle.clone();

        let job = Job::new_async(self.cron.as_str(), move |_uuid, _lock| {
            let cycle = cycle.clone();
            Box::pin(async move {
                let today = Local::now().date_naive();
                if let Err(e) = cycle.run(today).await {
                    error!("Daily cycle for {} failed: {:#}", today, e);
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Daily scheduler started successfully");

        // Keep scheduler running
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
        }
    }

    /// Runs the cycle once, outside the schedule.
    ///
    /// # Errors
    /// Returns an error if any step of the cycle fails.
    pub async fn run_once(&self, date: NaiveDate) -> Result<CycleSummary> {
        self.cycle.run(date).await
    }
}
