use anyhow::Result;
use chrono::Utc;
use contracts::domain::a001_product::Product;
use contracts::enums::ImportMode;
use contracts::usecases::u102_order_import::{
    ImportStats, OrderAction, OrderFetchRequest, OrderOutcome,
};
use serde_json::json;

use crate::domain::a001_product::service as product_service;
use crate::domain::a002_sales_order::service as order_service;
use crate::shared::config;
use crate::shared::logger::{self, RunContext};
use crate::shared::state;

use super::nalda_api_client::{NaldaApiClient, NaldaOrder, NaldaOrderItem};
use super::processors::order as processor;

/// Fetch orders from the marketplace and reconcile them with the local
/// order book. Per-order failures are recorded and the batch continues;
/// only configuration and fetch errors abort the run. The last-run
/// snapshot is persisted on every exit, failures included.
pub async fn run_order_import(
    ctx: &RunContext,
    request: OrderFetchRequest,
) -> Result<ImportStats> {
    let mut stats = ImportStats::for_request(ctx.run_id.clone(), ctx.trigger, &request);
    let started_at = stats.started_at;

    let result = execute(ctx, request, &mut stats).await;
    match &result {
        Ok(()) => stats.success = true,
        Err(e) => stats.error = Some(e.to_string()),
    }
    stats.duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;

    if let Err(e) = state::set_json(state::LAST_ORDER_IMPORT, &stats).await {
        tracing::warn!("failed to persist order import snapshot: {e}");
    }

    result.map(|()| stats)
}

async fn execute(
    ctx: &RunContext,
    request: OrderFetchRequest,
    stats: &mut ImportStats,
) -> Result<()> {
    let cfg = config::get();

    if !NaldaApiClient::is_configured(&cfg.nalda) {
        logger::error(Some(ctx), "Order import aborted: Nalda API is not configured.", None)
            .await;
        anyhow::bail!("Nalda API is not configured.");
    }

    let mode = ImportMode::from_code(&cfg.sync.order_import_mode).unwrap_or_default();
    logger::info(
        Some(ctx),
        &format!("Order import started (range: {}).", request.range.code()),
        None,
    )
    .await;

    let client = NaldaApiClient::new(&cfg.nalda)?;
    let (orders, items) = match client.fetch_orders_with_items(&request).await {
        Ok(fetched) => fetched,
        Err(e) => {
            logger::error(Some(ctx), &format!("Order fetch failed: {e}"), None).await;
            return Err(e.into());
        }
    };
    stats.fetched = orders.len() as u64;

    let (products, _) = product_service::load_catalog().await?;
    let mut grouped = processor::group_items(items);
    let mut outcomes: Vec<OrderOutcome> = Vec::with_capacity(orders.len());

    for order in &orders {
        let order_items = grouped.remove(&order.order_id).unwrap_or_default();
        let action = match process_order(order, &order_items, &products, mode).await {
            Ok(action) => action,
            Err(e) => {
                let message =
                    format!("Failed to import order #{}: {e}", order.order_id);
                logger::error(Some(ctx), &message, None).await;
                OrderAction::Failed { error: e.to_string() }
            }
        };
        stats.record(&action);
        outcomes.push(OrderOutcome {
            remote_order_id: order.order_id.to_string(),
            action,
        });
    }

    logger::success(
        Some(ctx),
        &format!(
            "Order import completed. Fetched: {}, Imported: {}, Updated: {}, Skipped: {}, Errors: {}.",
            stats.fetched, stats.imported, stats.updated, stats.skipped, stats.errors
        ),
        Some(json!({ "outcomes": outcomes })),
    )
    .await;

    Ok(())
}

async fn process_order(
    order: &NaldaOrder,
    items: &[NaldaOrderItem],
    products: &[Product],
    mode: ImportMode,
) -> Result<OrderAction> {
    let cfg = config::get();
    let now = Utc::now();
    let remote_id = order.order_id.to_string();

    match order_service::find_by_remote_id(&remote_id).await? {
        Some(existing) => {
            let (updated, changes) = processor::reconcile(&existing, order, items, now);
            order_service::save(&updated).await?;
            if changes.is_empty() {
                Ok(OrderAction::Skipped { reason: "no_changes".into() })
            } else {
                Ok(OrderAction::Updated { changes })
            }
        }
        None => {
            if mode == ImportMode::SyncOnly {
                return Ok(OrderAction::Skipped { reason: "sync_only_mode".into() });
            }
            let new_order = processor::build_order(
                order,
                items,
                products,
                &cfg.sync.source,
                &cfg.feed.currency,
                now,
            );
            order_service::create(&new_order).await?;
            Ok(OrderAction::Imported)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::enums::{DateRange, LogLevel, RunTrigger};

    // The only test in the crate that opens the database: the shared
    // connection and configuration are process-wide one-shot cells.
    #[tokio::test]
    async fn failed_run_persists_snapshot_and_terminal_log() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("orders.db");
        crate::shared::data::db::initialize_database(&db_path.to_string_lossy())
            .await
            .unwrap();
        crate::system::initialization::apply_schema().await.unwrap();

        // Empty api_key makes the run abort before any network I/O.
        let raw = r#"
            [database]
            path = "unused.db"
            [nalda]
            api_url = "https://example.test"
            api_key = ""
            [sftp]
            host = "h"
            username = "u"
            password = "p"
            remote_dir = "/in"
            [feed]
            export_dir = "out"
            country = "DE"
            currency = "EUR"
            [sync]
        "#;
        config::init(toml::from_str(raw).unwrap()).unwrap();

        let ctx = RunContext::new(RunTrigger::Manual);
        let request = OrderFetchRequest::range(DateRange::Today);
        assert!(run_order_import(&ctx, request).await.is_err());

        let snapshot: ImportStats = state::get_json(state::LAST_ORDER_IMPORT)
            .await
            .unwrap()
            .expect("failed run must still leave a snapshot");
        assert_eq!(snapshot.run_id, ctx.run_id);
        assert_eq!(snapshot.range, DateRange::Today);
        assert!(!snapshot.success);
        assert_eq!(snapshot.error.as_deref(), Some("Nalda API is not configured."));

        // The terminal entry must be readable as soon as the run returns.
        let entries = crate::shared::logger::repository::list_by_run(Some(&ctx.run_id))
            .await
            .unwrap();
        assert!(entries
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.contains("not configured")));
    }
}
