use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use contracts::enums::DateRange;
use contracts::usecases::u101_product_feed_sync::ProductSyncStats;
use contracts::usecases::u102_order_import::{ImportStats, OrderFetchRequest};

use crate::shared::config;
use crate::shared::logger::RunContext;
use crate::shared::state;
use crate::usecases::{u101_product_feed_sync, u102_order_import};

use super::pipeline::SyncPipeline;

/// Generates the product feed and uploads it.
pub struct ProductSyncPipeline;

#[async_trait]
impl SyncPipeline for ProductSyncPipeline {
    fn name(&self) -> &'static str {
        "product sync"
    }

    fn next_run_key(&self) -> &'static str {
        state::NEXT_PRODUCT_SYNC
    }

    fn schedule_code(&self) -> String {
        config::get().sync.product_schedule.clone()
    }

    async fn execute(&self, ctx: &RunContext) -> Result<String> {
        let stats = u101_product_feed_sync::executor::run_product_sync(ctx).await;
        if !stats.success {
            anyhow::bail!(
                stats
                    .error
                    .unwrap_or_else(|| "product sync failed".to_string())
            );
        }
        Ok(format!(
            "exported {} rows, skipped {}",
            stats.exported, stats.skipped
        ))
    }

    async fn record_aborted(&self, ctx: &RunContext) {
        let stats = ProductSyncStats {
            run_id: ctx.run_id.clone(),
            trigger: ctx.trigger,
            exported: 0,
            skipped: 0,
            file_size: 0,
            remote_path: None,
            started_at: Utc::now(),
            duration_ms: 0,
            success: false,
            error: Some("run aborted unexpectedly".to_string()),
        };
        if let Err(e) = state::set_json(state::LAST_PRODUCT_SYNC, &stats).await {
            tracing::warn!("failed to persist product sync snapshot: {e}");
        }
    }
}

/// Imports and reconciles marketplace orders.
pub struct OrderImportPipeline;

impl OrderImportPipeline {
    /// Fetch window for scheduled runs, taken from configuration.
    pub fn configured_request() -> OrderFetchRequest {
        let sync = &config::get().sync;
        request_from(&sync.order_range, sync.order_from.as_deref(), sync.order_to.as_deref())
    }
}

/// Build the fetch window from its configured spelling. A custom range
/// without two parseable ISO dates falls back to today instead of
/// producing a request that can never validate.
fn request_from(range_code: &str, from: Option<&str>, to: Option<&str>) -> OrderFetchRequest {
    let range = DateRange::from_code(range_code).unwrap_or(DateRange::Today);
    if range != DateRange::Custom {
        return OrderFetchRequest::range(range);
    }
    let parse = |raw: Option<&str>| {
        raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
    };
    match (parse(from), parse(to)) {
        (Some(from), Some(to)) => OrderFetchRequest::custom(from, to),
        _ => {
            tracing::warn!(
                "order_range is 'custom' but order_from/order_to are missing or invalid, \
                 falling back to today"
            );
            OrderFetchRequest::range(DateRange::Today)
        }
    }
}

#[async_trait]
impl SyncPipeline for OrderImportPipeline {
    fn name(&self) -> &'static str {
        "order import"
    }

    fn next_run_key(&self) -> &'static str {
        state::NEXT_ORDER_IMPORT
    }

    fn schedule_code(&self) -> String {
        config::get().sync.order_schedule.clone()
    }

    async fn execute(&self, ctx: &RunContext) -> Result<String> {
        let stats =
            u102_order_import::executor::run_order_import(ctx, Self::configured_request())
                .await?;
        Ok(format!(
            "fetched {}, imported {}, updated {}, skipped {}, errors {}",
            stats.fetched, stats.imported, stats.updated, stats.skipped, stats.errors
        ))
    }

    async fn record_aborted(&self, ctx: &RunContext) {
        let mut stats = ImportStats::for_request(
            ctx.run_id.clone(),
            ctx.trigger,
            &Self::configured_request(),
        );
        stats.error = Some("run aborted unexpectedly".to_string());
        if let Err(e) = state::set_json(state::LAST_ORDER_IMPORT, &stats).await {
            tracing::warn!("failed to persist order import snapshot: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ranges_pass_through() {
        let request = request_from("3m", None, None);
        assert_eq!(request.range, DateRange::Last3Months);
        assert_eq!(request.from, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn custom_range_picks_up_configured_dates() {
        let request = request_from("custom", Some("2025-01-01"), Some("2025-01-31"));
        assert_eq!(request.range, DateRange::Custom);
        assert_eq!(request.from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(request.to, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn custom_range_without_dates_falls_back_to_today() {
        for (from, to) in [
            (None, None),
            (Some("2025-01-01"), None),
            (Some("not-a-date"), Some("2025-01-31")),
        ] {
            let request = request_from("custom", from, to);
            assert_eq!(request.range, DateRange::Today);
            assert!(request.validate().is_ok());
        }
    }

    #[test]
    fn unknown_range_code_defaults_to_today() {
        assert_eq!(request_from("fortnightly", None, None).range, DateRange::Today);
    }
}
