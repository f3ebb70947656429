use crate::model_spec::{GridEntry, ModelKind, ModelParams};
use crate::schema::FeatureColumn;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub experiment: ExperimentConfig,
    pub sources: SourcesConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the live snapshot.
    pub data_dir: PathBuf,
    /// Directory holding fitted model artifacts.
    pub model_dir: PathBuf,
    /// Directory for experiment and prediction reports.
    pub report_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Window widths evaluated independently.
    pub windows: Vec<usize>,
    /// Feature columns flattened into each window, in this order.
    pub features: Vec<FeatureColumn>,
    /// Leading share of examples used for fitting; the tail is held out.
    pub train_fraction: f64,
    /// Probability above which a rise is predicted.
    pub threshold: f64,
    /// Worker threads; `None` uses available cores minus one.
    #[serde(default)]
    pub workers: Option<usize>,
    pub grid: Vec<GridEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub articles: PathBuf,
    pub scores: PathBuf,
    pub prices: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Six-field cron expression (sec min hour day month weekday).
    pub cron: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
                model_dir: PathBuf::from("models"),
                report_dir: PathBuf::from("reports"),
            },
            experiment: ExperimentConfig::default(),
            sources: SourcesConfig {
                articles: PathBuf::from("input/articles.csv"),
                scores: PathBuf::from("input/scores.csv"),
                prices: PathBuf::from("input/prices.csv"),
            },
            schedule: ScheduleConfig {
                cron: "0 30 23 * * *".to_string(),
            },
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        let boosted = ModelParams::default()
            .with_estimators(100)
            .with_learning_rate(0.1);
        Self {
            windows: vec![5, 15, 30],
            features: FeatureColumn::ALL.to_vec(),
            train_fraction: 0.8,
            threshold: 0.5,
            workers: None,
            grid: vec![
                GridEntry::new(ModelKind::LightGbm, boosted.clone().with_num_leaves(31)),
                GridEntry::new(ModelKind::XgBoost, boosted.clone().with_max_depth(3)),
                GridEntry::new(
                    ModelKind::RandomForest,
                    ModelParams::default().with_estimators(100).with_max_depth(5),
                ),
                GridEntry::new(
                    ModelKind::RandomForest,
                    ModelParams::default().with_estimators(200).with_max_depth(10),
                ),
                GridEntry::new(ModelKind::DecisionTree, ModelParams::default().with_max_depth(3)),
                GridEntry::new(ModelKind::DecisionTree, ModelParams::default().with_max_depth(5)),
                GridEntry::new(ModelKind::GradientBoosting, boosted.with_max_depth(3)),
            ],
        }
    }
}

impl ExperimentConfig {
    /// Model kinds present in the grid, in first-seen order.
    #[must_use]
    pub fn model_kinds(&self) -> Vec<ModelKind> {
        let mut kinds = Vec::new();
        for entry in &self.grid {
            if !kinds.contains(&entry.model) {
                kinds.push(entry.model);
            }
        }
        kinds
    }

    /// Validates the experiment section.
    ///
    /// # Errors
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.windows.is_empty() {
            bail!("experiment.windows must not be empty");
        }
        if let Some(w) = self.windows.iter().find(|w| **w == 0) {
            bail!("experiment.windows contains invalid width {w}");
        }
        if self.features.is_empty() {
            bail!("experiment.features must not be empty");
        }
        let mut seen = HashSet::new();
        for column in &self.features {
            if !seen.insert(column) {
                bail!("experiment.features lists {column} more than once");
            }
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            bail!(
                "experiment.train_fraction must be in (0, 1), got {}",
                self.train_fraction
            );
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!(
                "experiment.threshold must be in [0, 1], got {}",
                self.threshold
            );
        }
        if self.workers == Some(0) {
            bail!("experiment.workers must be at least 1");
        }
        if self.grid.is_empty() {
            bail!("experiment.grid must contain at least one model");
        }
        Ok(())
    }
}

impl AppConfig {
    /// Validates all sections.
    ///
    /// # Errors
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.experiment.validate()?;
        if self.schedule.cron.split_whitespace().count() != 6 {
            bail!(
                "schedule.cron must have six fields (sec min hour day month weekday), got '{}'",
                self.schedule.cron
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.experiment.windows, vec![5, 15, 30]);
        assert_eq!(config.experiment.features.len(), 9);
        assert_eq!(config.experiment.grid.len(), 7);
    }

    #[test]
    fn model_kinds_are_deduplicated_in_grid_order() {
        let kinds = ExperimentConfig::default().model_kinds();
        assert_eq!(kinds, ModelKind::ALL.to_vec());
    }

    #[test]
    fn rejects_zero_window() {
        let mut config = ExperimentConfig::default();
        config.windows = vec![5, 0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_features() {
        let mut config = ExperimentConfig::default();
        config.features = vec![FeatureColumn::Close, FeatureColumn::Close];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn rejects_degenerate_train_fraction() {
        let mut config = ExperimentConfig::default();
        config.train_fraction = 1.0;
        assert!(config.validate().is_err());
        config.train_fraction = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_grid() {
        let mut config = ExperimentConfig::default();
        config.grid.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_five_field_cron() {
        let mut config = AppConfig::default();
        config.schedule.cron = "30 23 * * *".to_string();
        assert!(config.validate().is_err());
    }
}
