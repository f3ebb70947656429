//! Read-only summary of what is stored on disk.

use anyhow::Result;
use chrono::NaiveDate;
use sentistock_core::{AppConfig, ModelKind};
use sentistock_data::{CsvSnapshotStore, SnapshotKey, SnapshotStore};
use sentistock_models::artifact_path;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactStatus {
    pub model: ModelKind,
    pub window: usize,
    pub path: PathBuf,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreStatus {
    pub data_dir: PathBuf,
    pub keys: Vec<SnapshotKey>,
    pub latest: Option<SnapshotKey>,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub pending_label: bool,
    pub calendar_gaps: i64,
    pub artifacts: Vec<ArtifactStatus>,
}

impl StoreStatus {
    /// Inspects the snapshot directory and the expected model artifacts.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be listed or the newest
    /// snapshot cannot be read.
    pub fn collect(config: &AppConfig) -> Result<Self> {
        let store = CsvSnapshotStore::new(&config.storage.data_dir);
        let keys = store.keys()?;
        let latest = keys.last().copied();

        let (rows, first_date, last_date, pending_label, calendar_gaps) = match latest {
            Some(key) => {
                let table = store.load(key)?;
                (
                    table.len(),
                    table.first_date(),
                    table.max_date(),
                    table.has_pending_label(),
                    table.calendar_gaps(),
                )
            }
            None => (0, None, None, false, 0),
        };

        let mut artifacts = Vec::new();
        for model in config.experiment.model_kinds() {
            for window in &config.experiment.windows {
                let path = artifact_path(&config.storage.model_dir, model, *window);
                artifacts.push(ArtifactStatus {
                    model,
                    window: *window,
                    present: path.exists(),
                    path,
                });
            }
        }

        Ok(Self {
            data_dir: config.storage.data_dir.clone(),
            keys,
            latest,
            rows,
            first_date,
            last_date,
            pending_label,
            calendar_gaps,
            artifacts,
        })
    }

    /// More than one stored snapshot means a rotation was interrupted.
    #[must_use]
    pub fn has_stale_snapshots(&self) -> bool {
        self.keys.len() > 1
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data directory:   {}", self.data_dir.display())?;
        match self.latest {
            Some(key) => writeln!(f, "Latest snapshot:  {key}")?,
            None => writeln!(f, "Latest snapshot:  none")?,
        }
        if self.has_stale_snapshots() {
            let keys: Vec<String> = self.keys.iter().map(SnapshotKey::tag).collect();
            writeln!(f, "⚠️  Multiple snapshots present: {}", keys.join(", "))?;
        }
        writeln!(f, "Rows:             {}", self.rows)?;
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            writeln!(f, "Date range:       {first} .. {last}")?;
        }
        writeln!(f, "Calendar gaps:    {}", self.calendar_gaps)?;
        writeln!(
            f,
            "Pending label:    {}",
            if self.pending_label { "yes" } else { "no" }
        )?;
        writeln!(f, "Artifacts:")?;
        for artifact in &self.artifacts {
            writeln!(
                f,
                "  {} {:<18} window={:<4} {}",
                if artifact.present { "✓" } else { "✗" },
                artifact.model.as_str(),
                artifact.window,
                artifact.path.display()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentistock_data::{merge, ObservationRow, ObservationTable};
    use tempfile::TempDir;

    fn config(root: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.data_dir = root.join("data");
        config.storage.model_dir = root.join("models");
        config.storage.report_dir = root.join("reports");
        config
    }

    fn row(day: u32, close: f64) -> ObservationRow {
        ObservationRow {
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            news_count: 1,
            avg_negative: 0.1,
            avg_neutral: 0.8,
            avg_positive: 0.1,
            open: close,
            high: close,
            low: close,
            close,
            volume: 10.0,
            label: None,
        }
    }

    #[test]
    fn empty_store_reports_nothing() {
        let dir = TempDir::new().unwrap();
        let status = StoreStatus::collect(&config(dir.path())).unwrap();
        assert!(status.latest.is_none());
        assert_eq!(status.rows, 0);
        // 5 model kinds x 3 windows in the default grid
        assert_eq!(status.artifacts.len(), 15);
        assert!(status.artifacts.iter().all(|a| !a.present));
        assert!(status.to_string().contains("none"));
    }

    #[test]
    fn reports_latest_snapshot_details() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let store = CsvSnapshotStore::new(&config.storage.data_dir);
        let table = merge(ObservationTable::new(), row(1, 10.0)).unwrap();
        let table = merge(table, row(4, 11.0)).unwrap();
        store
            .commit(SnapshotKey::for_date(table.max_date().unwrap()), &table)
            .unwrap();

        let status = StoreStatus::collect(&config).unwrap();
        assert_eq!(status.rows, 2);
        assert_eq!(status.calendar_gaps, 2);
        assert!(status.pending_label);
        assert!(!status.has_stale_snapshots());
        assert_eq!(status.latest.map(|k| k.tag()), Some("250504".to_string()));
    }
}
