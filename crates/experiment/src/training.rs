//! Parallel training over the combination grid.

use crate::combination::{enumerate_combinations, Combination};
use crate::report::{ExperimentRecord, ExperimentReport, SkippedCombination};
use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use sentistock_core::{ExperimentConfig, ModelKind};
use sentistock_data::ObservationTable;
use sentistock_features::{training_matrix, WindowSpec};
use sentistock_models::{
    artifact_path, remove_artifact, Classifier, ClassificationMetrics, Model, ModelArtifact,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Worker threads: the configured count, else available cores minus one.
/// Never below one.
#[must_use]
pub fn worker_count(configured: Option<usize>) -> usize {
    configured
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
        })
        .max(1)
}

enum Outcome {
    Trained {
        record: ExperimentRecord,
        model: Model,
    },
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TrainingDriver {
    config: ExperimentConfig,
    model_dir: PathBuf,
}

impl TrainingDriver {
    #[must_use]
    pub fn new(config: ExperimentConfig, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            model_dir: model_dir.into(),
        }
    }

    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Runs every combination against `table`.
    ///
    /// Workers share the table read-only and hand back fitted models; the
    /// best model per (model, window) is written once the pool has drained.
    ///
    /// # Errors
    /// Returns an error if the thread pool cannot be built or an artifact
    /// cannot be written. Per-combination failures are reported, not raised.
    pub fn run(&self, table: &ObservationTable) -> Result<ExperimentReport> {
        let combinations = enumerate_combinations(&self.config);
        let workers = worker_count(self.config.workers);

        info!(
            combinations = combinations.len(),
            workers,
            rows = table.len(),
            "Starting training experiments"
        );

        // Local pool so repeated runs can use different sizes
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .context("Failed to create training thread pool")?;

        let outcomes: Vec<Outcome> = pool.install(|| {
            combinations
                .par_iter()
                .map(|combination| self.run_one(table, combination))
                .collect()
        });

        let mut report = ExperimentReport::default();
        let mut best: BTreeMap<(ModelKind, usize), (&Combination, ExperimentRecord, Model)> =
            BTreeMap::new();

        for (combination, outcome) in combinations.iter().zip(outcomes) {
            match outcome {
                Outcome::Trained { record, model } => {
                    info!(
                        model = %combination.model,
                        window = combination.window,
                        params = %combination.params,
                        accuracy = record.accuracy,
                        f1 = record.f1,
                        roc_auc = ?record.roc_auc,
                        "Experiment completed"
                    );
                    let key = (combination.model, combination.window);
                    let better = best
                        .get(&key)
                        .map_or(true, |(_, current, _)| record.rank_cmp(current).is_lt());
                    if better {
                        best.insert(key, (combination, record.clone(), model));
                    }
                    report.records.push(record);
                }
                Outcome::Skipped(reason) => {
                    warn!(combination = %combination, %reason, "Experiment skipped");
                    report.skipped.push(SkippedCombination::new(combination, reason));
                }
                Outcome::Failed(reason) => {
                    error!(combination = %combination, %reason, "Experiment failed");
                    report.failed.push(SkippedCombination::new(combination, reason));
                }
            }
        }

        let trained: BTreeSet<(ModelKind, usize)> = best.keys().copied().collect();
        for ((kind, window), (combination, record, model)) in best {
            let artifact = ModelArtifact {
                window,
                columns: self.config.features.clone(),
                params: combination.params.clone(),
                trained_at: Utc::now(),
                train_size: record.train_size,
                model,
            };
            let path = artifact
                .save(&self.model_dir)
                .with_context(|| format!("Failed to save {kind} window {window} model"))?;
            report.artifacts.push(path);
        }

        // A model kept from an earlier run would be scored as if it were current
        for kind in self.config.model_kinds() {
            for &window in &self.config.windows {
                if trained.contains(&(kind, window)) {
                    continue;
                }
                if remove_artifact(&self.model_dir, kind, window)
                    .with_context(|| format!("Failed to remove stale {kind} window {window} model"))?
                {
                    warn!(model = %kind, window, "No model trained this run; removed previous artifact");
                    report.retired.push(artifact_path(&self.model_dir, kind, window));
                }
            }
        }

        info!(
            trained = report.records.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            artifacts = report.artifacts.len(),
            retired = report.retired.len(),
            "Training experiments finished"
        );
        Ok(report)
    }

    fn run_one(&self, table: &ObservationTable, combination: &Combination) -> Outcome {
        let spec = match WindowSpec::new(combination.window, self.config.features.clone()) {
            Ok(spec) => spec,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        let matrix = match training_matrix(table, &spec) {
            Ok(matrix) => matrix,
            Err(e) if e.is_skip() => return Outcome::Skipped(e.to_string()),
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        let (train, test) = matrix.split(self.config.train_fraction);
        if train.is_empty() || test.is_empty() {
            return Outcome::Skipped(format!(
                "{} examples are too few for a train/test split",
                matrix.len()
            ));
        }
        debug!(
            combination = %combination,
            train = train.len(),
            test = test.len(),
            skipped_windows = matrix.skipped(),
            "Fitting"
        );

        let x_train: Vec<Vec<f64>> = train.iter().map(|e| e.features.clone()).collect();
        let y_train: Vec<u8> = train.iter().map(|e| e.label).collect();
        let x_test: Vec<Vec<f64>> = test.iter().map(|e| e.features.clone()).collect();
        let y_test: Vec<u8> = test.iter().map(|e| e.label).collect();

        let result = Model::new(combination.model, &combination.params).and_then(|mut model| {
            model.fit(&x_train, &y_train)?;
            let proba = model.predict_proba_batch(&x_test)?;
            Ok((model, proba))
        });

        match result {
            Ok((model, proba)) => {
                let metrics = ClassificationMetrics::evaluate(&y_test, &proba, self.config.threshold);
                Outcome::Trained {
                    record: ExperimentRecord {
                        model: combination.model,
                        window: combination.window,
                        params: combination.params.to_string(),
                        accuracy: metrics.accuracy,
                        f1: metrics.f1,
                        roc_auc: metrics.roc_auc,
                        train_size: train.len(),
                        test_size: test.len(),
                    },
                    model,
                }
            }
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::zigzag_table;
    use sentistock_core::{GridEntry, ModelParams};
    use tempfile::TempDir;

    fn small_config() -> ExperimentConfig {
        ExperimentConfig {
            windows: vec![3, 5],
            workers: Some(2),
            grid: vec![
                GridEntry::new(ModelKind::DecisionTree, ModelParams::default().with_max_depth(2)),
                GridEntry::new(ModelKind::DecisionTree, ModelParams::default().with_max_depth(4)),
                GridEntry::new(
                    ModelKind::GradientBoosting,
                    ModelParams::default().with_estimators(10).with_max_depth(2),
                ),
            ],
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn worker_count_is_at_least_one() {
        assert_eq!(worker_count(Some(3)), 3);
        assert!(worker_count(None) >= 1);
    }

    #[test]
    fn trains_every_combination_and_saves_one_artifact_per_key() {
        let dir = TempDir::new().unwrap();
        let driver = TrainingDriver::new(small_config(), dir.path());
        let report = driver.run(&zigzag_table(60)).unwrap();

        assert_eq!(report.records.len(), 6);
        assert!(report.skipped.is_empty());
        assert!(report.failed.is_empty());
        // decisiontree x {3,5} + gradientboosting x {3,5}
        assert_eq!(report.artifacts.len(), 4);
        for window in [3, 5] {
            assert!(artifact_path(dir.path(), ModelKind::DecisionTree, window).exists());
            assert!(artifact_path(dir.path(), ModelKind::GradientBoosting, window).exists());
        }
    }

    #[test]
    fn records_keep_enumeration_order() {
        let dir = TempDir::new().unwrap();
        let report = TrainingDriver::new(small_config(), dir.path())
            .run(&zigzag_table(60))
            .unwrap();
        let order: Vec<(ModelKind, usize)> =
            report.records.iter().map(|r| (r.model, r.window)).collect();
        assert_eq!(order[0], (ModelKind::DecisionTree, 3));
        assert_eq!(order[1], (ModelKind::DecisionTree, 3));
        assert_eq!(order[5], (ModelKind::GradientBoosting, 5));
    }

    #[test]
    fn split_sizes_follow_train_fraction() {
        let dir = TempDir::new().unwrap();
        let report = TrainingDriver::new(small_config(), dir.path())
            .run(&zigzag_table(60))
            .unwrap();
        let first = &report.records[0];
        // 60 rows, W=3: 57 candidates, trailing row unlabeled
        assert_eq!(first.train_size + first.test_size, 56);
        assert_eq!(first.train_size, 44);
    }

    #[test]
    fn saved_artifact_is_the_best_parameter_set() {
        let dir = TempDir::new().unwrap();
        let report = TrainingDriver::new(small_config(), dir.path())
            .run(&zigzag_table(60))
            .unwrap();

        let trees: Vec<&ExperimentRecord> = report
            .records
            .iter()
            .filter(|r| r.model == ModelKind::DecisionTree && r.window == 3)
            .collect();
        let expected = if trees[1].rank_cmp(trees[0]).is_lt() { trees[1] } else { trees[0] };

        let artifact = ModelArtifact::load(dir.path(), ModelKind::DecisionTree, 3).unwrap();
        assert_eq!(artifact.params.to_string(), expected.params);
        assert_eq!(artifact.columns, ExperimentConfig::default().features);
    }

    #[test]
    fn degenerate_table_skips_every_combination() {
        let dir = TempDir::new().unwrap();
        let rows: Vec<f64> = (0..30).map(|i| 100.0 - f64::from(i)).collect();
        let table = {
            use sentistock_data::{merge_batch, ObservationRow, ObservationTable};
            let rows = rows
                .iter()
                .enumerate()
                .map(|(i, &close)| ObservationRow {
                    date: crate::test_support::date(i as i64),
                    news_count: 1,
                    avg_negative: 0.3,
                    avg_neutral: 0.4,
                    avg_positive: 0.3,
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 10.0,
                    label: None,
                })
                .collect();
            merge_batch(ObservationTable::new(), rows).unwrap()
        };

        let report = TrainingDriver::new(small_config(), dir.path()).run(&table).unwrap();
        assert!(!report.has_results());
        assert_eq!(report.skipped.len(), 6);
        assert!(report.artifacts.is_empty());
        assert!(report.skipped[0].reason.contains("degenerate"));
    }

    #[test]
    fn short_table_is_skipped_not_failed() {
        let dir = TempDir::new().unwrap();
        let report = TrainingDriver::new(small_config(), dir.path())
            .run(&zigzag_table(4))
            .unwrap();
        assert!(report.failed.is_empty());
        assert_eq!(report.skipped.len(), 6);
    }

    #[test]
    fn skipped_key_drops_artifact_from_earlier_run() {
        let dir = TempDir::new().unwrap();
        let driver = TrainingDriver::new(small_config(), dir.path());
        let first = driver.run(&zigzag_table(60)).unwrap();
        assert_eq!(first.artifacts.len(), 4);
        assert!(first.retired.is_empty());

        let second = driver.run(&zigzag_table(4)).unwrap();
        assert!(second.artifacts.is_empty());
        assert_eq!(second.retired.len(), 4);
        for window in [3, 5] {
            assert!(!artifact_path(dir.path(), ModelKind::DecisionTree, window).exists());
            assert!(!artifact_path(dir.path(), ModelKind::GradientBoosting, window).exists());
        }
    }

    #[test]
    fn retraining_keeps_artifacts_for_trained_keys() {
        let dir = TempDir::new().unwrap();
        let driver = TrainingDriver::new(small_config(), dir.path());
        driver.run(&zigzag_table(60)).unwrap();
        let second = driver.run(&zigzag_table(60)).unwrap();
        assert_eq!(second.artifacts.len(), 4);
        assert!(second.retired.is_empty());
    }
}
