//! Time-series store: single-generation CSV snapshots of the observation table.
//!
//! Each daily run reads yesterday's snapshot, commits today's, and only then
//! deletes yesterday's. A snapshot is keyed by its calendar date, so no
//! registry is needed to find the previous one.
//!
//! # Example
//!
//! ```ignore
//! use sentistock_data::{CsvSnapshotStore, SnapshotKey, SnapshotStore};
//!
//! let store = CsvSnapshotStore::new("data");
//! let previous = SnapshotKey::previous(run_date);
//! let table = store.load(previous)?;
//! // ... merge today's row ...
//! store.commit(SnapshotKey::for_date(run_date), &merged)?;
//! store.rotate(previous)?;
//! ```

use crate::error::DataError;
use crate::models::{ObservationRow, ObservationTable};
use chrono::{Duration, NaiveDate};
use fs4::FileExt;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const TAG_FORMAT: &str = "%y%m%d";
const FILE_SUFFIX: &str = "_sentiment_stock.csv";
const LOCK_FILE: &str = ".sentistock.lock";

/// Persistence key of a snapshot: the calendar date it covers up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey(NaiveDate);

impl SnapshotKey {
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Key of the snapshot a run on `run_date` starts from (the day before).
    #[must_use]
    pub fn previous(run_date: NaiveDate) -> Self {
        Self(run_date - Duration::days(1))
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Compact date tag, e.g. `250507` for 2025-05-07.
    #[must_use]
    pub fn tag(&self) -> String {
        self.0.format(TAG_FORMAT).to_string()
    }

    /// Parses a compact date tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.len() != 6 || !tag.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(tag, TAG_FORMAT).ok().map(Self)
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{FILE_SUFFIX}", self.tag())
    }

    fn from_file_name(name: &str) -> Option<Self> {
        name.strip_suffix(FILE_SUFFIX).and_then(Self::from_tag)
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Exclusive run lock, held as an OS advisory lock on the lock file.
///
/// The kernel releases it when the holder exits, so a crashed run leaves
/// the file behind but never the lock.
#[derive(Debug)]
pub struct StoreLock {
    file: Option<File>,
    path: Option<PathBuf>,
}

impl StoreLock {
    /// A lock that guards nothing, for stores without shared state.
    #[must_use]
    pub fn unguarded() -> Self {
        Self {
            file: None,
            path: None,
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Closing the handle releases the lock; the file itself stays
        if self.file.take().is_some() {
            if let Some(path) = &self.path {
                debug!(path = %path.display(), "Released store lock");
            }
        }
    }
}

/// Storage of observation-table snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Reads the snapshot stored under `key`.
    fn load(&self, key: SnapshotKey) -> Result<ObservationTable, DataError>;

    /// Durably persists `table` under `key`, replacing any snapshot with the same key.
    fn commit(&self, key: SnapshotKey, table: &ObservationTable) -> Result<(), DataError>;

    /// Deletes the snapshot under `old_key`. Returns false if it did not exist.
    fn rotate(&self, old_key: SnapshotKey) -> Result<bool, DataError>;

    /// Keys of all stored snapshots, oldest first.
    fn keys(&self) -> Result<Vec<SnapshotKey>, DataError>;

    /// Newest stored key, if any.
    fn latest(&self) -> Result<Option<SnapshotKey>, DataError> {
        Ok(self.keys()?.into_iter().max())
    }

    /// Takes the exclusive run lock.
    fn lock(&self) -> Result<StoreLock, DataError> {
        Ok(StoreLock::unguarded())
    }
}

/// Snapshot store backed by one CSV file per key in a directory.
#[derive(Debug, Clone)]
pub struct CsvSnapshotStore {
    dir: PathBuf,
}

impl CsvSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: SnapshotKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    #[must_use]
    pub fn exists(&self, key: SnapshotKey) -> bool {
        self.path_for(key).exists()
    }

    fn write_csv(path: &Path, table: &ObservationTable) -> Result<(), DataError> {
        let file = File::create(path)?;
        {
            let mut writer = csv::Writer::from_writer(&file);
            for row in table.rows() {
                writer.serialize(row)?;
            }
            if table.is_empty() {
                // serde writes headers only with the first record
                writer.write_record(HEADER)?;
            }
            writer.flush()?;
        }
        file.sync_all()?;
        Ok(())
    }

    fn read_csv(path: &Path) -> Result<ObservationTable, DataError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(BufReader::new(file));
        let rows = reader
            .deserialize::<ObservationRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ObservationTable::from_rows(rows))
    }

    /// Reads `path` back and checks it holds exactly `table`.
    fn verify(key: SnapshotKey, path: &Path, table: &ObservationTable) -> Result<(), DataError> {
        let readback = Self::read_csv(path).map_err(|e| DataError::Verification {
            key: key.tag(),
            reason: format!("read-back failed: {e}"),
        })?;
        if readback != *table {
            return Err(DataError::Verification {
                key: key.tag(),
                reason: format!(
                    "wrote {} rows but read back {} differing rows",
                    table.len(),
                    readback.len()
                ),
            });
        }
        Ok(())
    }

    fn sync_dir(&self) {
        // Persist the rename itself; not every platform supports syncing a directory.
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }
    }
}

const HEADER: [&str; 11] = [
    "date",
    "news_count",
    "avg_negative",
    "avg_neutral",
    "avg_positive",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "label",
];

impl SnapshotStore for CsvSnapshotStore {
    fn load(&self, key: SnapshotKey) -> Result<ObservationTable, DataError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(DataError::NotFound {
                key: key.tag(),
                path,
            });
        }

        let table = Self::read_csv(&path)?;
        debug!(key = %key, rows = table.len(), "Loaded snapshot");
        Ok(table)
    }

    fn commit(&self, key: SnapshotKey, table: &ObservationTable) -> Result<(), DataError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.tmp", key.file_name()));

        if let Err(e) = Self::write_csv(&tmp, table) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        self.sync_dir();

        if let Err(e) = Self::verify(key, &path, table) {
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        info!(
            key = %key,
            path = %path.display(),
            rows = table.len(),
            "Committed snapshot"
        );
        Ok(())
    }

    fn rotate(&self, old_key: SnapshotKey) -> Result<bool, DataError> {
        let path = self.path_for(old_key);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(key = %old_key, path = %path.display(), "Removed previous snapshot");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    key = %old_key,
                    path = %path.display(),
                    "Previous snapshot does not exist, nothing to remove"
                );
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<SnapshotKey>, DataError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(SnapshotKey::from_file_name)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn lock(&self) -> Result<StoreLock, DataError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs4::lock_contended_error().raw_os_error() {
                return Err(DataError::Locked { path });
            }
            return Err(e.into());
        }

        // Owner pid, for operators only; the advisory lock is authoritative
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        debug!(path = %path.display(), "Acquired store lock");
        Ok(StoreLock {
            file: Some(file),
            path: Some(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::models::observation::test_support::{date, row, table_of_closes};
    use tempfile::TempDir;

    fn store() -> (TempDir, CsvSnapshotStore) {
        let dir = TempDir::new().unwrap();
        let store = CsvSnapshotStore::new(dir.path().join("snapshots"));
        (dir, store)
    }

    fn labeled_table() -> ObservationTable {
        let mut table = ObservationTable::new();
        for (i, close) in [100.0, f64::NAN, f64::NAN, 101.5, 99.25].iter().enumerate() {
            table = merge(table, row(i as i64, *close)).unwrap();
        }
        table
    }

    // =========================================================================
    // Key Tests
    // =========================================================================

    #[test]
    fn key_tag_is_compact_date() {
        let key = SnapshotKey::for_date(NaiveDate::from_ymd_opt(2025, 5, 7).unwrap());
        assert_eq!(key.tag(), "250507");
        assert_eq!(key.file_name(), "250507_sentiment_stock.csv");
        assert_eq!(SnapshotKey::from_tag("250507"), Some(key));
    }

    #[test]
    fn previous_key_is_day_before_run() {
        let run = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(SnapshotKey::previous(run).tag(), "250228");
    }

    #[test]
    fn malformed_tags_are_rejected() {
        assert!(SnapshotKey::from_tag("2505071").is_none());
        assert!(SnapshotKey::from_tag("25a507").is_none());
        assert!(SnapshotKey::from_tag("251340").is_none());
    }

    // =========================================================================
    // Load / Commit Tests
    // =========================================================================

    #[test]
    fn commit_then_load_round_trips() {
        let (_dir, store) = store();
        let table = labeled_table();
        let key = SnapshotKey::for_date(date(4));

        store.commit(key, &table).unwrap();
        let loaded = store.load(key).unwrap();

        assert_eq!(loaded, table);
        assert!(loaded.has_pending_label());
    }

    #[test]
    fn round_trip_preserves_leading_nan_and_fractional_values() {
        let (_dir, store) = store();
        let mut first = row(0, f64::NAN);
        first.volume = f64::NAN;
        first.avg_negative = 0.0412;
        first.avg_positive = 0.1255;
        let table = merge(ObservationTable::new(), first).unwrap();
        let table = merge(table, row(1, 72_300.0)).unwrap();
        let key = SnapshotKey::for_date(date(1));

        store.commit(key, &table).unwrap();
        assert_eq!(store.load(key).unwrap(), table);
    }

    #[test]
    fn empty_table_round_trips() {
        let (_dir, store) = store();
        let key = SnapshotKey::for_date(date(0));
        store.commit(key, &ObservationTable::new()).unwrap();
        assert!(store.load(key).unwrap().is_empty());
    }

    #[test]
    fn load_missing_snapshot_is_not_found() {
        let (_dir, store) = store();
        let err = store.load(SnapshotKey::for_date(date(0))).unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
    }

    #[test]
    fn commit_leaves_no_temporary_file() {
        let (_dir, store) = store();
        store
            .commit(SnapshotKey::for_date(date(2)), &table_of_closes(&[1.0, 2.0]))
            .unwrap();
        let names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["250503_sentiment_stock.csv".to_string()]);
    }

    #[test]
    fn failed_commit_keeps_previous_snapshot_readable() {
        let (_dir, store) = store();
        let old_key = SnapshotKey::for_date(date(3));
        let new_key = SnapshotKey::for_date(date(4));
        let old_table = table_of_closes(&[100.0, 101.0]);
        store.commit(old_key, &old_table).unwrap();

        // A directory squatting on the target path makes the rename fail.
        fs::create_dir_all(store.path_for(new_key)).unwrap();
        assert!(store.commit(new_key, &labeled_table()).is_err());

        assert_eq!(store.load(old_key).unwrap(), old_table);
    }

    // =========================================================================
    // Rotation / Listing Tests
    // =========================================================================

    #[test]
    fn rotate_removes_old_snapshot() {
        let (_dir, store) = store();
        let key = SnapshotKey::for_date(date(0));
        store.commit(key, &table_of_closes(&[1.0])).unwrap();

        assert!(store.rotate(key).unwrap());
        assert!(!store.exists(key));
    }

    #[test]
    fn rotate_missing_snapshot_is_noop() {
        let (_dir, store) = store();
        assert!(!store.rotate(SnapshotKey::for_date(date(0))).unwrap());
    }

    #[test]
    fn keys_lists_snapshots_in_date_order() {
        let (_dir, store) = store();
        assert!(store.keys().unwrap().is_empty());
        assert_eq!(store.latest().unwrap(), None);

        for offset in [5, 1, 3] {
            store
                .commit(SnapshotKey::for_date(date(offset)), &table_of_closes(&[1.0]))
                .unwrap();
        }
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        let keys = store.keys().unwrap();
        assert_eq!(
            keys,
            vec![
                SnapshotKey::for_date(date(1)),
                SnapshotKey::for_date(date(3)),
                SnapshotKey::for_date(date(5)),
            ]
        );
        assert_eq!(store.latest().unwrap(), Some(SnapshotKey::for_date(date(5))));
    }

    // =========================================================================
    // Lock Tests
    // =========================================================================

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let (_dir, store) = store();
        let guard = store.lock().unwrap();
        assert!(matches!(store.lock(), Err(DataError::Locked { .. })));
        drop(guard);
        assert!(store.lock().is_ok());
    }

    #[test]
    fn stale_lock_file_from_dead_run_is_reclaimed() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        // Left behind by a run that was killed before releasing it
        let lock_path = store.dir().join(LOCK_FILE);
        fs::write(&lock_path, "4194303\n").unwrap();

        let guard = store.lock().unwrap();
        let owner = fs::read_to_string(&lock_path).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());
        drop(guard);
        assert!(store.lock().is_ok());
    }

    #[test]
    fn released_lock_leaves_file_but_not_lock() {
        let (_dir, store) = store();
        drop(store.lock().unwrap());
        assert!(store.dir().join(LOCK_FILE).exists());
        assert!(store.lock().is_ok());
    }

    // =========================================================================
    // Verification Tests
    // =========================================================================

    #[test]
    fn verify_rejects_differing_contents() {
        let (_dir, store) = store();
        let key = SnapshotKey::for_date(date(1));
        store.commit(key, &table_of_closes(&[100.0, 101.0])).unwrap();

        let err = CsvSnapshotStore::verify(key, &store.path_for(key), &labeled_table()).unwrap_err();
        assert!(matches!(err, DataError::Verification { .. }));
    }

    #[test]
    fn verify_reports_unreadable_file_as_verification_failure() {
        let (_dir, store) = store();
        let key = SnapshotKey::for_date(date(1));
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path_for(key), "date,news_count\nnot-a-date,x\n").unwrap();

        match CsvSnapshotStore::verify(key, &store.path_for(key), &labeled_table()) {
            Err(DataError::Verification { key: tag, reason }) => {
                assert_eq!(tag, "250502");
                assert!(reason.starts_with("read-back failed"), "{reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn verify_accepts_identical_contents() {
        let (_dir, store) = store();
        let key = SnapshotKey::for_date(date(4));
        let table = labeled_table();
        store.commit(key, &table).unwrap();
        assert!(CsvSnapshotStore::verify(key, &store.path_for(key), &table).is_ok());
    }
}
