use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::RunTrigger;

/// A product left out of the feed and the reason why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedProduct {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    /// Machine-readable reason, e.g. "missing_gtin" or "missing_price".
    pub reason: String,
}

/// Outcome of generating one feed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResult {
    pub file_path: String,
    pub file_size: u64,
    /// Data rows written, header excluded.
    pub rows_written: u64,
    pub skipped_count: u64,
    /// Sample of skipped products, capped so the log stays readable.
    pub skipped_sample: Vec<SkippedProduct>,
}

/// Outcome of delivering the feed file to the marketplace server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub remote_path: String,
    pub bytes_sent: u64,
    /// "sftp" or "scp", whichever transport actually delivered the file.
    pub transport: String,
}

/// Snapshot persisted after each product sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSyncStats {
    pub run_id: String,
    pub trigger: RunTrigger,
    pub exported: u64,
    pub skipped: u64,
    pub file_size: u64,
    pub remote_path: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}
