//! Experiment results: per-combination records and their persisted forms.

use crate::combination::Combination;
use anyhow::{Context, Result};
use sentistock_core::ModelKind;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Metrics of one trained combination. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub model: ModelKind,
    pub window: usize,
    pub params: String,
    pub accuracy: f64,
    pub f1: f64,
    pub roc_auc: Option<f64>,
    pub train_size: usize,
    pub test_size: usize,
}

impl ExperimentRecord {
    /// Ranking order: ROC-AUC descending (missing last), then accuracy.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        let auc = |r: &Self| r.roc_auc.unwrap_or(f64::NEG_INFINITY);
        auc(other)
            .total_cmp(&auc(self))
            .then_with(|| other.accuracy.total_cmp(&self.accuracy))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCombination {
    pub model: ModelKind,
    pub window: usize,
    pub params: String,
    pub reason: String,
}

impl SkippedCombination {
    #[must_use]
    pub fn new(combination: &Combination, reason: impl Into<String>) -> Self {
        Self {
            model: combination.model,
            window: combination.window,
            params: combination.params.to_string(),
            reason: reason.into(),
        }
    }
}

/// Outcome of a training run across all combinations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentReport {
    /// Successful combinations in enumeration order.
    pub records: Vec<ExperimentRecord>,
    /// Degenerate or too-small matrices.
    pub skipped: Vec<SkippedCombination>,
    /// Combinations that errored.
    pub failed: Vec<SkippedCombination>,
    /// Artifacts written, one per (model, window).
    pub artifacts: Vec<PathBuf>,
    /// Artifacts from earlier runs removed because their (model, window)
    /// produced no model this run.
    pub retired: Vec<PathBuf>,
}

impl ExperimentReport {
    #[must_use]
    pub fn has_results(&self) -> bool {
        !self.records.is_empty()
    }

    /// Records sorted best first.
    #[must_use]
    pub fn ranked(&self) -> Vec<&ExperimentRecord> {
        let mut ranked: Vec<&ExperimentRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| a.rank_cmp(b));
        ranked
    }

    /// Writes `<tag>_experiment_results.csv` and `<tag>_experiment_summary.md`.
    ///
    /// # Errors
    /// Returns an error if the directory or either file cannot be written.
    pub fn write(&self, dir: &Path, tag: &str) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

        let csv_path = dir.join(format!("{tag}_experiment_results.csv"));
        let mut writer = csv::Writer::from_path(&csv_path)
            .with_context(|| format!("Failed to create {}", csv_path.display()))?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        let md_path = dir.join(format!("{tag}_experiment_summary.md"));
        fs::write(&md_path, self.to_markdown(tag))
            .with_context(|| format!("Failed to write {}", md_path.display()))?;

        info!(
            results = %csv_path.display(),
            summary = %md_path.display(),
            records = self.records.len(),
            "Wrote experiment reports"
        );
        Ok((csv_path, md_path))
    }

    #[must_use]
    pub fn to_markdown(&self, tag: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Experiment summary {tag}\n");

        if self.records.is_empty() {
            out.push_str("No combination produced a result.\n");
        } else {
            out.push_str("| Rank | Model | Window | Params | Accuracy | F1 | ROC-AUC | Train | Test |\n");
            out.push_str("|---:|---|---:|---|---:|---:|---:|---:|---:|\n");
            for (i, r) in self.ranked().iter().enumerate() {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {:.4} | {:.4} | {} | {} | {} |",
                    i + 1,
                    r.model,
                    r.window,
                    r.params,
                    r.accuracy,
                    r.f1,
                    format_auc(r.roc_auc),
                    r.train_size,
                    r.test_size
                );
            }
        }

        for (title, list) in [("Skipped", &self.skipped), ("Failed", &self.failed)] {
            if list.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n## {title}\n");
            for s in list {
                let _ = writeln!(out, "- {} window={} [{}]: {}", s.model, s.window, s.params, s.reason);
            }
        }
        out
    }
}

pub(crate) fn format_auc(auc: Option<f64>) -> String {
    auc.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}
