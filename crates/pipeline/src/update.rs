//! One daily update: collect the day's inputs and fold them into the stored
//! history.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use sentistock_core::{ArticleSource, PriceSource, SentimentScorer};
use sentistock_data::{
    merge, normalize, DataError, ObservationTable, SentimentObservation, SnapshotKey, SnapshotStore,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    pub date: NaiveDate,
    pub key: SnapshotKey,
    /// Rows in the committed snapshot.
    pub rows: usize,
    pub news_count: u32,
    /// Headlines with text that were scored.
    pub scored: usize,
    pub non_trading: bool,
    /// True when no earlier snapshot existed.
    pub first_run: bool,
    /// True when the previous snapshot was deleted.
    pub rotated: bool,
    /// Older snapshots deleted besides the previous one.
    pub stale_removed: usize,
}

pub struct DailyUpdate<S: SnapshotStore> {
    store: S,
    articles: Arc<dyn ArticleSource>,
    scorer: Arc<dyn SentimentScorer>,
    prices: Arc<dyn PriceSource>,
}

impl<S: SnapshotStore> DailyUpdate<S> {
    pub fn new(
        store: S,
        articles: Arc<dyn ArticleSource>,
        scorer: Arc<dyn SentimentScorer>,
        prices: Arc<dyn PriceSource>,
    ) -> Self {
        Self {
            store,
            articles,
            scorer,
            prices,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends `run_date` to the history and rotates yesterday's snapshot.
    ///
    /// Collaborator and merge failures abort before anything is written. The
    /// previous snapshot is only deleted after today's commit has been
    /// verified.
    ///
    /// # Errors
    /// Returns an error if the store is locked, a collaborator fails, the
    /// previous snapshot is missing while others exist, or the merge,
    /// commit or rotation fails.
    pub async fn run(&self, run_date: NaiveDate) -> Result<UpdateSummary> {
        let _lock = self.store.lock().context("Failed to lock snapshot store")?;

        let articles = self
            .articles
            .fetch_articles(run_date)
            .await
            .with_context(|| format!("Failed to fetch articles for {run_date}"))?;

        let mut scores = Vec::new();
        for article in articles.iter().filter(|a| a.has_text()) {
            let score = self
                .scorer
                .score(&article.headline)
                .await
                .with_context(|| format!("Failed to score headline '{}'", article.headline))?;
            scores.push(score);
        }

        let news_count = u32::try_from(articles.len()).context("Article count overflows u32")?;
        let sentiment = SentimentObservation::from_scores(run_date, news_count, &scores);

        let quote = self
            .prices
            .fetch_quote(run_date)
            .await
            .with_context(|| format!("Failed to fetch quote for {run_date}"))?;

        let row = normalize(&sentiment, &quote)?;
        let non_trading = row.is_non_trading();

        let previous_key = SnapshotKey::previous(run_date);
        let key = SnapshotKey::for_date(run_date);
        let (previous, first_run) = self.load_previous(previous_key, key)?;

        let table = merge(previous, row)?;
        self.store
            .commit(key, &table)
            .with_context(|| format!("Failed to commit snapshot {key}"))?;

        let (rotated, stale_removed) = self.rotate_older(key, previous_key)?;

        info!(
            date = %run_date,
            key = %key,
            rows = table.len(),
            news_count,
            scored = scores.len(),
            non_trading,
            stale_removed,
            "Daily update committed"
        );

        Ok(UpdateSummary {
            date: run_date,
            key,
            rows: table.len(),
            news_count,
            scored: scores.len(),
            non_trading,
            first_run,
            rotated,
            stale_removed,
        })
    }

    /// Deletes every snapshot older than the one just committed.
    ///
    /// Besides `previous_key` this clears leftovers of a run that crashed
    /// between commit and rotation. Returns whether `previous_key` was
    /// removed and how many other snapshots were.
    fn rotate_older(&self, key: SnapshotKey, previous_key: SnapshotKey) -> Result<(bool, usize)> {
        let mut rotated = false;
        let mut stale_removed = 0;
        for old in self.store.keys()?.into_iter().filter(|k| *k < key) {
            let removed = self
                .store
                .rotate(old)
                .with_context(|| format!("Failed to rotate snapshot {old}"))?;
            if old == previous_key {
                rotated = removed;
            } else if removed {
                warn!(key = %old, "Removed stale snapshot left by an earlier run");
                stale_removed += 1;
            }
        }
        Ok((rotated, stale_removed))
    }

    fn load_previous(
        &self,
        previous_key: SnapshotKey,
        key: SnapshotKey,
    ) -> Result<(ObservationTable, bool)> {
        match self.store.load(previous_key) {
            Ok(table) => Ok((table, false)),
            Err(DataError::NotFound { .. }) => match self.store.latest()? {
                None => {
                    warn!(key = %previous_key, "No snapshot found; starting a new history");
                    Ok((ObservationTable::new(), true))
                }
                Some(newest) if newest >= key => {
                    bail!("Snapshot {newest} already exists; {} has been updated", key.date())
                }
                Some(newest) => bail!(
                    "Previous snapshot {previous_key} is missing but {newest} exists; \
                     backfill the days after {} first",
                    newest.date()
                ),
            },
            Err(e) => Err(e).with_context(|| format!("Failed to load snapshot {previous_key}")),
        }
    }

    /// Runs the update for every date in `from..=to`, in order.
    ///
    /// # Errors
    /// Stops at and returns the first failing date's error.
    pub async fn backfill(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<UpdateSummary>> {
        if from > to {
            bail!("Backfill start {from} is after end {to}");
        }
        let mut summaries = Vec::new();
        for date in from.iter_days().take_while(|d| *d <= to) {
            let summary = self
                .run(date)
                .await
                .with_context(|| format!("Backfill stopped at {date}"))?;
            summaries.push(summary);
        }
        info!(%from, %to, days = summaries.len(), "Backfill complete");
        Ok(summaries)
    }
}
