use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::LogLevel;

/// One row of the sync log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Structured payload attached to the entry, if any.
    pub context: Option<serde_json::Value>,
    /// Run the entry belongs to. None for entries written outside a run.
    pub run_id: Option<String>,
}

/// Log entry counts broken down by level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogCounts {
    pub info: u64,
    pub success: u64,
    pub warning: u64,
    pub error: u64,
}

impl LogCounts {
    pub fn total(&self) -> u64 {
        self.info + self.success + self.warning + self.error
    }
}

/// Aggregated view of one run for listings: the run id, its time span
/// and how many entries of each level it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// None groups the orphan entries that carry no run id.
    pub run_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: LogCounts,
}
