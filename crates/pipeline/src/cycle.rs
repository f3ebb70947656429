//! The full daily cycle: update the history, retrain, predict, write reports.

use crate::sources::{CsvArticleSource, CsvPriceSource, CsvScoreLookup};
use crate::update::{DailyUpdate, UpdateSummary};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use sentistock_core::AppConfig;
use sentistock_data::{CsvSnapshotStore, ObservationTable, SnapshotKey, SnapshotStore};
use sentistock_experiment::{ExperimentReport, PredictionDriver, PredictionReport, TrainingDriver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one cycle produced.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub update: UpdateSummary,
    pub experiments: ExperimentReport,
    pub predictions: PredictionReport,
}

/// Wires the configured store, sources and drivers together.
#[derive(Debug, Clone)]
pub struct DailyCycle {
    config: AppConfig,
    store: CsvSnapshotStore,
    training: TrainingDriver,
    prediction: PredictionDriver,
}

impl DailyCycle {
    #[must_use]
    pub fn from_config(config: AppConfig) -> Self {
        let store = CsvSnapshotStore::new(&config.storage.data_dir);
        let training =
            TrainingDriver::new(config.experiment.clone(), &config.storage.model_dir);
        let prediction =
            PredictionDriver::new(config.experiment.clone(), &config.storage.model_dir);
        Self {
            config,
            store,
            training,
            prediction,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &CsvSnapshotStore {
        &self.store
    }

    fn report_dir(&self) -> PathBuf {
        self.config.storage.report_dir.clone()
    }

    /// Builds the update step from the configured input files.
    ///
    /// The score file is read on every call so a long-running scheduler sees
    /// scores appended between runs.
    ///
    /// # Errors
    /// Returns an error if the score file cannot be read.
    pub fn daily_update(&self) -> Result<DailyUpdate<CsvSnapshotStore>> {
        let sources = &self.config.sources;
        let scorer = CsvScoreLookup::from_path(&sources.scores)?;
        Ok(DailyUpdate::new(
            self.store.clone(),
            Arc::new(CsvArticleSource::new(&sources.articles)),
            Arc::new(scorer),
            Arc::new(CsvPriceSource::new(&sources.prices)),
        ))
    }

    /// Resolves an explicit date to its key, or falls back to the newest snapshot.
    ///
    /// # Errors
    /// Returns an error if no date is given and the store is empty.
    pub fn resolve_key(&self, date: Option<NaiveDate>) -> Result<SnapshotKey> {
        match date {
            Some(date) => Ok(SnapshotKey::for_date(date)),
            None => self.store.latest()?.ok_or_else(|| {
                anyhow!(
                    "No snapshots in {}; run an update first",
                    self.store.dir().display()
                )
            }),
        }
    }

    fn load(&self, key: SnapshotKey) -> Result<ObservationTable> {
        self.store
            .load(key)
            .with_context(|| format!("Failed to load snapshot {key}"))
    }

    /// Trains every combination on the snapshot under `key` and writes the reports.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be loaded, the pool fails,
    /// or a report or artifact cannot be written.
    pub async fn train(&self, key: SnapshotKey) -> Result<ExperimentReport> {
        let table = self.load(key)?;
        let driver = self.training.clone();
        let report = tokio::task::spawn_blocking(move || driver.run(&table))
            .await
            .context("Training task panicked")??;

        if report.has_results() {
            report.write(&self.report_dir(), &key.tag())?;
        } else {
            warn!(key = %key, skipped = report.skipped.len(), failed = report.failed.len(),
                "No successful experiment; nothing reported");
        }
        Ok(report)
    }

    /// Predicts the day after the snapshot under `key` and writes the predictions.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be loaded or the report cannot
    /// be written.
    pub fn predict(&self, key: SnapshotKey) -> Result<PredictionReport> {
        let table = self.load(key)?;
        let report = self.prediction.run(&table);
        if report.has_predictions() {
            report.write(&self.report_dir(), &key.tag())?;
        } else {
            warn!(key = %key, "No usable prediction");
        }
        Ok(report)
    }

    /// Update, then train, then predict for `date`.
    ///
    /// # Errors
    /// Returns the first failing step's error. A failed update stops the
    /// cycle before training.
    pub async fn run(&self, date: NaiveDate) -> Result<CycleSummary> {
        info!(%date, "Starting daily cycle");
        let update = self.daily_update()?.run(date).await?;
        let experiments = self.train(update.key).await?;
        let predictions = self.predict(update.key)?;

        info!(
            %date,
            rows = update.rows,
            records = experiments.records.len(),
            artifacts = experiments.artifacts.len(),
            predictions = predictions.predicted().count(),
            "Daily cycle complete"
        );
        Ok(CycleSummary {
            update,
            experiments,
            predictions,
        })
    }
}
