use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{DateRange, RunTrigger};

use super::request::OrderFetchRequest;

/// What the reconciler decided to do with one fetched order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// New local order created.
    Imported,
    /// Existing order refreshed with detected changes.
    Updated { changes: Vec<String> },
    /// Nothing to do: no changes, or creation suppressed by mode.
    Skipped { reason: String },
    /// Processing this order failed; the batch continues.
    Failed { error: String },
}

/// Per-order result keyed by the marketplace order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOutcome {
    pub remote_order_id: String,
    pub action: OrderAction,
}

/// Totals of one order import run, including the window that was
/// synced. Persisted as the last-run snapshot whether the run succeeded
/// or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub run_id: String,
    pub trigger: RunTrigger,
    pub range: DateRange,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub fetched: u64,
    pub imported: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

impl ImportStats {
    /// Blank stats for a run over the given window.
    pub fn for_request(run_id: String, trigger: RunTrigger, request: &OrderFetchRequest) -> Self {
        Self {
            run_id,
            trigger,
            range: request.range,
            from: request.from,
            to: request.to,
            fetched: 0,
            imported: 0,
            updated: 0,
            skipped: 0,
            errors: 0,
            started_at: Utc::now(),
            duration_ms: 0,
            success: false,
            error: None,
        }
    }

    pub fn record(&mut self, action: &OrderAction) {
        match action {
            OrderAction::Imported => self.imported += 1,
            OrderAction::Updated { .. } => self.updated += 1,
            OrderAction::Skipped { .. } => self.skipped += 1,
            OrderAction::Failed { .. } => self.errors += 1,
        }
    }
}
