//! Processing state store.
//!
//! Durable mapping from canonical ID (or folder path, before an ID is
//! known) to a processing record. Single writer; all other components
//! receive read snapshots and return decisions.

use crate::models::state::{ProcessingRecord, ProcessingStatus, StateFile};
use crate::{Error, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Failed trailer searches beyond this count may exclude an item.
pub const TRAILER_MAX_ATTEMPTS: u32 = 2;

/// Only items released before this year can be permanently excluded.
/// Newer content almost certainly has trailers on the platform.
pub const EXCLUSION_YEAR_CUTOFF: u16 = 2000;

/// State key for an item with a known canonical ID.
pub fn key_for_id(canonical_id: &str) -> String {
    format!("tmdb-{canonical_id}")
}

/// State key for a folder not yet matched to a canonical ID.
pub fn key_for_path(path: &Path) -> String {
    format!("path:{}", path.to_string_lossy())
}

/// Pure retry/exclusion policy, applied on every failed trailer attempt.
pub fn apply_trailer_failure(record: &mut ProcessingRecord, release_year: u16) {
    record.trailer_attempts += 1;
    record.last_attempt = Some(Utc::now());
    if record.trailer_attempts >= TRAILER_MAX_ATTEMPTS && release_year < EXCLUSION_YEAR_CUTOFF {
        record.trailer_permanently_excluded = true;
    }
}

/// Durable store of per-item processing records.
pub struct StateStore {
    path: PathBuf,
    state: StateFile,
}

impl StateStore {
    /// Load the store from disk, creating an empty one when the file is
    /// missing. `Failed` records revert to `Pending` so the next run
    /// retries them; trailer exclusions stay durable.
    pub fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::PersistenceFailure(format!("read {}: {e}", path.display())))?;
            serde_json::from_str::<StateFile>(&content)
                .map_err(|e| Error::PersistenceFailure(format!("parse {}: {e}", path.display())))?
        } else {
            StateFile::default()
        };

        let mut store = Self { path, state };
        for record in store.state.records.values_mut() {
            if record.status == ProcessingStatus::Failed {
                record.status = ProcessingStatus::Pending;
            }
        }
        Ok(store)
    }

    /// Snapshot of the record for a key, defaulted when unseen.
    pub fn get(&self, key: &str) -> ProcessingRecord {
        self.state.records.get(key).cloned().unwrap_or_default()
    }

    /// Skip decision: `Complete` items are not reprocessed unless forced.
    pub fn should_process(&self, key: &str, force: bool) -> bool {
        force || self.get(key).status != ProcessingStatus::Complete
    }

    /// Whether a trailer search may still be attempted for this item.
    pub fn should_attempt_trailer(&self, key: &str) -> bool {
        !self.get(key).trailer_permanently_excluded
    }

    /// Advance an item's status. Persists immediately.
    pub fn set_status(
        &mut self,
        key: &str,
        status: ProcessingStatus,
        display_name: &str,
    ) -> Result<()> {
        let record = self.state.records.entry(key.to_string()).or_default();
        record.status = status;
        record.last_attempt = Some(Utc::now());
        record.display_name = display_name.to_string();
        self.save()
    }

    /// Move a record from a path key to its canonical-ID key once tagging
    /// succeeds. Attempt counters carry over.
    pub fn migrate_key(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if let Some(record) = self.state.records.remove(from) {
            self.state.records.entry(to.to_string()).or_insert(record);
            self.save()?;
        }
        Ok(())
    }

    /// Record a failed trailer search/download, applying the exclusion
    /// policy for pre-2000 releases.
    pub fn record_trailer_failure(
        &mut self,
        key: &str,
        display_name: &str,
        release_year: u16,
    ) -> Result<()> {
        let record = self.state.records.entry(key.to_string()).or_default();
        record.display_name = display_name.to_string();
        apply_trailer_failure(record, release_year);
        if record.trailer_permanently_excluded {
            tracing::info!(
                "Permanently excluding '{}' from trailer search (failed {} times)",
                display_name,
                record.trailer_attempts
            );
        }
        self.save()
    }

    /// Clear failure tracking after a successful trailer download.
    pub fn record_trailer_success(&mut self, key: &str) -> Result<()> {
        if let Some(record) = self.state.records.get_mut(key) {
            record.trailer_attempts = 0;
            record.trailer_permanently_excluded = false;
        }
        self.save()
    }

    /// Number of permanently excluded items.
    pub fn excluded_count(&self) -> usize {
        self.state
            .records
            .values()
            .filter(|r| r.trailer_permanently_excluded)
            .count()
    }

    /// All records, for state inspection.
    pub fn records(&self) -> impl Iterator<Item = (&String, &ProcessingRecord)> {
        self.state.records.iter()
    }

    /// Stamp the end of a run.
    pub fn update_last_scan(&mut self) -> Result<()> {
        self.state.last_scan = Some(Utc::now());
        self.save()
    }

    /// Drop all records. Exposed for the `state clear` command.
    pub fn clear(&mut self) -> Result<()> {
        self.state = StateFile::default();
        self.save()
    }

    fn save(&self) -> Result<()> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let tmp = self.path.with_extension("tmp");
            let content = serde_json::to_string_pretty(&self.state)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            std::fs::write(&tmp, content)?;
            std::fs::rename(&tmp, &self.path)?;
            Ok(())
        };
        write().map_err(|e| Error::PersistenceFailure(format!("write {}: {e}", self.path.display())))
    }
}
