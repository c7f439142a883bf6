use chrono::Utc;
use contracts::usecases::u101_product_feed_sync::ProductSyncStats;
use serde_json::json;

use crate::domain::a001_product::service as product_service;
use crate::shared::config;
use crate::shared::format::format_number;
use crate::shared::logger::{self, RunContext};
use crate::shared::state;

use super::feed_generator::{self, FeedSettings};
use super::sftp_uploader::SftpUploader;

/// Generate the product feed, upload it and record the outcome.
///
/// The run never bubbles an error out: failures are logged against the
/// run, counted into the persisted snapshot and reported through
/// `ProductSyncStats.success`.
pub async fn run_product_sync(ctx: &RunContext) -> ProductSyncStats {
    let started_at = Utc::now();
    let mut stats = ProductSyncStats {
        run_id: ctx.run_id.clone(),
        trigger: ctx.trigger,
        exported: 0,
        skipped: 0,
        file_size: 0,
        remote_path: None,
        started_at,
        duration_ms: 0,
        success: false,
        error: None,
    };

    logger::info(Some(ctx), "Product sync started.", None).await;

    match execute(ctx, &mut stats).await {
        Ok(()) => {
            stats.success = true;
            logger::success(
                Some(ctx),
                &format!(
                    "Product sync completed. Exported: {}, Skipped: {}.",
                    stats.exported, stats.skipped
                ),
                Some(json!({
                    "exported": stats.exported,
                    "skipped": stats.skipped,
                    "fileSize": stats.file_size,
                    "remotePath": stats.remote_path,
                })),
            )
            .await;
        }
        Err(e) => {
            stats.error = Some(e.to_string());
            logger::error(Some(ctx), &format!("Product sync failed: {e}"), None).await;
        }
    }

    stats.duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;

    if let Err(e) = state::set_json(state::LAST_PRODUCT_SYNC, &stats).await {
        tracing::warn!("failed to persist product sync snapshot: {e}");
    }

    stats
}

async fn execute(ctx: &RunContext, stats: &mut ProductSyncStats) -> anyhow::Result<()> {
    let cfg = config::get();

    // Fail before generating anything when the upload cannot succeed.
    let uploader = SftpUploader::new(cfg.sftp.clone());
    uploader.check_configured()?;

    let (products, categories) = product_service::load_catalog().await?;
    if products.is_empty() {
        anyhow::bail!("No products found to export.");
    }

    let settings = FeedSettings::from_config(&cfg.feed);
    let export_dir = config::resolve_path(&cfg.feed.export_dir);

    let feed =
        feed_generator::generate_feed(&products, &categories, &settings, &export_dir)?;
    stats.exported = feed.rows_written;
    stats.skipped = feed.skipped_count;
    stats.file_size = feed.file_size;

    logger::info(
        Some(ctx),
        &format!(
            "Feed generated: {} rows, {} skipped, {} bytes.",
            feed.rows_written,
            feed.skipped_count,
            format_number(feed.file_size as usize)
        ),
        (!feed.skipped_sample.is_empty())
            .then(|| json!({ "skippedSample": feed.skipped_sample })),
    )
    .await;

    let upload = uploader.upload(feed.file_path.clone().into(), None).await?;
    stats.remote_path = Some(upload.remote_path.clone());
    logger::info(
        Some(ctx),
        &format!(
            "Feed uploaded to {} ({} bytes, {}).",
            upload.remote_path,
            format_number(upload.bytes_sent as usize),
            upload.transport
        ),
        None,
    )
    .await;

    match feed_generator::cleanup_old_exports(&export_dir, settings.keep_exports) {
        Ok(removed) if removed > 0 => {
            logger::info(Some(ctx), &format!("Removed {removed} old export files."), None)
                .await;
        }
        Ok(_) => {}
        Err(e) => {
            logger::warning(Some(ctx), &format!("Export cleanup failed: {e}"), None).await;
        }
    }

    Ok(())
}
