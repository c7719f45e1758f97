//! Processing state data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a library item is in its lifecycle.
///
/// Advances monotonically except `Failed -> Pending` on the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Tagged,
    Complete,
    Failed,
}

impl Default for ProcessingStatus {
    fn default() -> Self {
        ProcessingStatus::Pending
    }
}

/// Per-item processing record, keyed by canonical ID once known
/// (else by normalized folder path).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingRecord {
    #[serde(default)]
    pub status: ProcessingStatus,
    #[serde(default)]
    pub trailer_attempts: u32,
    #[serde(default)]
    pub trailer_permanently_excluded: bool,
    #[serde(default)]
    pub last_attempt: Option<DateTime<Utc>>,
    /// Human-readable folder name kept beside the record for log triage.
    #[serde(default)]
    pub display_name: String,
}

/// On-disk shape of the state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub records: BTreeMap<String, ProcessingRecord>,
    #[serde(default)]
    pub last_scan: Option<DateTime<Utc>>,
}
