//! Same-day predictions from persisted models.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sentistock_core::{ExperimentConfig, ModelKind};
use sentistock_data::ObservationTable;
use sentistock_features::{live_vector, WindowSpec};
use sentistock_models::{Classifier, ModelArtifact, ModelError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionStatus {
    Predicted {
        rise_probability: f64,
        prediction: u8,
    },
    MissingModel {
        path: PathBuf,
    },
    /// Not enough history or a missing cell in the live window.
    Skipped {
        reason: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub model: ModelKind,
    pub window: usize,
    #[serde(flatten)]
    pub status: PredictionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    /// The unlabeled row being predicted; `None` if the newest row already
    /// has a label.
    pub date: Option<NaiveDate>,
    pub threshold: f64,
    pub outcomes: Vec<PredictionOutcome>,
}

impl PredictionReport {
    pub fn predicted(&self) -> impl Iterator<Item = (&PredictionOutcome, f64, u8)> {
        self.outcomes.iter().filter_map(|o| match o.status {
            PredictionStatus::Predicted {
                rise_probability,
                prediction,
            } => Some((o, rise_probability, prediction)),
            _ => None,
        })
    }

    #[must_use]
    pub fn has_predictions(&self) -> bool {
        self.predicted().next().is_some()
    }

    /// Writes `<tag>_predictions.json`.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, dir: &Path, tag: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
        let path = dir.join(format!("{tag}_predictions.json"));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote predictions");
        Ok(path)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone)]
pub struct PredictionDriver {
    config: ExperimentConfig,
    model_dir: PathBuf,
}

impl PredictionDriver {
    #[must_use]
    pub fn new(config: ExperimentConfig, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            model_dir: model_dir.into(),
        }
    }

    /// Predicts the row after the newest one for every (model, window).
    ///
    /// Only runs when the newest row is still unlabeled. Each combination
    /// fails independently.
    #[must_use]
    pub fn run(&self, table: &ObservationTable) -> PredictionReport {
        let mut report = PredictionReport {
            date: None,
            threshold: self.config.threshold,
            outcomes: Vec::new(),
        };

        let Some(today) = table.last().filter(|r| r.label.is_none()) else {
            warn!("Newest row already has a label; nothing to predict");
            return report;
        };
        report.date = Some(today.date);

        for model in self.config.model_kinds() {
            for &window in &self.config.windows {
                let status = self.predict_one(table, model, window);
                match &status {
                    PredictionStatus::Predicted {
                        rise_probability,
                        prediction,
                    } => info!(%model, window, rise_probability, prediction, "Predicted"),
                    other => warn!(%model, window, status = ?other, "No prediction"),
                }
                report.outcomes.push(PredictionOutcome {
                    model,
                    window,
                    status,
                });
            }
        }
        report
    }

    fn predict_one(&self, table: &ObservationTable, model: ModelKind, window: usize) -> PredictionStatus {
        let artifact = match ModelArtifact::load(&self.model_dir, model, window) {
            Ok(artifact) => artifact,
            Err(ModelError::MissingArtifact { path }) => return PredictionStatus::MissingModel { path },
            Err(e) => return PredictionStatus::Failed { error: e.to_string() },
        };

        // The artifact's own columns keep the live vector aligned with training
        let spec = match WindowSpec::new(artifact.window, artifact.columns.clone()) {
            Ok(spec) => spec,
            Err(e) => return PredictionStatus::Failed { error: e.to_string() },
        };
        let live = match live_vector(table, &spec) {
            Ok(live) => live,
            Err(e) => return PredictionStatus::Skipped { reason: e.to_string() },
        };

        match artifact.model.predict_proba(&live.features) {
            Ok(probability) => PredictionStatus::Predicted {
                rise_probability: round4(probability),
                prediction: u8::from(probability > self.config.threshold),
            },
            Err(e) => PredictionStatus::Failed { error: e.to_string() },
        }
    }
}
