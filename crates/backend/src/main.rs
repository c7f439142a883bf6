pub mod domain;
pub mod shared;
pub mod system;
pub mod usecases;

use std::sync::Arc;

use contracts::enums::{RunStatus, RunTrigger};
use system::sync::{run_pipeline, OrderImportPipeline, ProductSyncPipeline, SyncPipeline, SyncWorker};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use usecases::u101_product_feed_sync::sftp_uploader::SftpUploader;
use usecases::u102_order_import::nalda_api_client::NaldaApiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("backend.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlx=warn,sea_orm=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    let config = shared::config::load_config()?;
    shared::config::init(config)?;

    let db_path = shared::config::resolve_path(&shared::config::get().database.path);
    shared::data::db::initialize_database(&db_path.to_string_lossy()).await?;
    system::initialization::apply_schema().await?;

    let command = std::env::args().nth(1);
    match command.as_deref() {
        None | Some("worker") => run_worker().await,
        Some("product-sync") => run_once(Arc::new(ProductSyncPipeline)).await,
        Some("order-sync") => run_once(Arc::new(OrderImportPipeline)).await,
        Some("test-sftp") => test_sftp().await,
        Some("test-api") => test_api().await,
        Some("catalog-import") => catalog_import(std::env::args().nth(2)).await,
        Some("status") => show_status().await,
        Some("orders") => show_orders(std::env::args().nth(2)).await,
        Some("logs") => show_logs(std::env::args().nth(2)).await,
        Some("runs") => show_runs().await,
        Some("run-log") => show_run_log(std::env::args().nth(2)).await,
        Some("export-logs") => export_logs(std::env::args().nth(2)).await,
        Some("clear-logs") => clear_logs().await,
        Some(other) => anyhow::bail!(
            "unknown command '{other}' (expected: worker, product-sync, order-sync, \
             test-sftp, test-api, catalog-import, status, orders, logs, runs, run-log, \
             export-logs, clear-logs)"
        ),
    }
}

async fn run_worker() -> anyhow::Result<()> {
    let pipelines: Vec<Arc<dyn SyncPipeline>> =
        vec![Arc::new(ProductSyncPipeline), Arc::new(OrderImportPipeline)];
    let interval = shared::config::get().sync.worker_interval_secs;
    SyncWorker::new(pipelines, interval).run_loop().await;
    Ok(())
}

async fn run_once(pipeline: Arc<dyn SyncPipeline>) -> anyhow::Result<()> {
    match run_pipeline(pipeline, RunTrigger::Manual).await {
        RunStatus::Success => Ok(()),
        RunStatus::Failed => anyhow::bail!("run failed, see the sync log for details"),
    }
}

async fn test_sftp() -> anyhow::Result<()> {
    let uploader = SftpUploader::new(shared::config::get().sftp.clone());
    uploader.test_connection().await?;
    tracing::info!("SFTP connection OK");
    Ok(())
}

async fn test_api() -> anyhow::Result<()> {
    let client = NaldaApiClient::new(&shared::config::get().nalda)?;
    let message = client.test_connection().await?;
    tracing::info!("{message}");
    Ok(())
}

/// `catalog-import <file.json>` - load a catalog snapshot exported from
/// the source store into the local mirror.
async fn catalog_import(path: Option<String>) -> anyhow::Result<()> {
    #[derive(serde::Deserialize)]
    struct CatalogFile {
        #[serde(default)]
        products: Vec<contracts::domain::a001_product::Product>,
        #[serde(default)]
        categories: Vec<contracts::domain::a001_product::ProductCategory>,
    }

    let path = path.ok_or_else(|| anyhow::anyhow!("usage: catalog-import <file.json>"))?;
    let raw = std::fs::read_to_string(&path)?;
    let catalog: CatalogFile = serde_json::from_str(&raw)?;
    let (products, categories) =
        domain::a001_product::service::import_catalog(&catalog.products, &catalog.categories)
            .await?;
    tracing::info!("Imported {products} products and {categories} categories from {path}");
    Ok(())
}

async fn show_status() -> anyhow::Result<()> {
    use contracts::usecases::u101_product_feed_sync::ProductSyncStats;
    use contracts::usecases::u102_order_import::ImportStats;

    let products = domain::a001_product::service::count_products().await?;
    let orders = domain::a002_sales_order::service::count_imported().await?;
    println!("Catalog products: {products}");
    println!("Imported orders:  {orders}");

    match shared::state::get_json::<ProductSyncStats>(shared::state::LAST_PRODUCT_SYNC).await? {
        Some(s) => println!(
            "Last product sync: {} ({}) exported {} skipped {} {}",
            s.started_at.format("%Y-%m-%d %H:%M:%S"),
            s.run_id,
            s.exported,
            s.skipped,
            if s.success { "ok" } else { "FAILED" }
        ),
        None => println!("Last product sync: never"),
    }
    match shared::state::get_json::<ImportStats>(shared::state::LAST_ORDER_IMPORT).await? {
        Some(s) => println!(
            "Last order import: {} ({}) range {} fetched {} imported {} updated {} errors {} {}",
            s.started_at.format("%Y-%m-%d %H:%M:%S"),
            s.run_id,
            s.range.code(),
            s.fetched,
            s.imported,
            s.updated,
            s.errors,
            if s.success { "ok" } else { "FAILED" }
        ),
        None => println!("Last order import: never"),
    }
    Ok(())
}

async fn show_orders(limit: Option<String>) -> anyhow::Result<()> {
    let limit = limit.and_then(|s| s.parse().ok()).unwrap_or(20);
    for order in domain::a002_sales_order::service::list_recent(limit).await? {
        println!(
            "#{:<10} {}  {:<10} {:>8.2} {}  {} item(s)",
            order.remote_order_id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status.code(),
            order.total,
            order.currency,
            order.items.len()
        );
    }
    Ok(())
}

/// `logs [limit|level]` - recent entries, newest first. A level name
/// narrows the listing instead of a count.
async fn show_logs(arg: Option<String>) -> anyhow::Result<()> {
    let mut limit = 50u64;
    let mut level = None;
    if let Some(arg) = arg {
        if let Ok(n) = arg.parse::<u64>() {
            limit = n;
        } else {
            level = contracts::enums::LogLevel::from_code(&arg);
            if level.is_none() {
                anyhow::bail!("expected a number or one of: info, success, warning, error");
            }
        }
    }
    for entry in shared::logger::repository::list_recent(limit, level).await? {
        print_log_entry(&entry);
    }
    Ok(())
}

async fn show_runs() -> anyhow::Result<()> {
    let summaries = shared::logger::repository::run_summaries().await?;
    for summary in &summaries {
        let run = summary.run_id.as_deref().unwrap_or("(no run)");
        let c = &summary.counts;
        println!(
            "{}  {} .. {}  info:{} success:{} warning:{} error:{}",
            run,
            summary.started_at.format("%Y-%m-%d %H:%M:%S"),
            summary.finished_at.format("%Y-%m-%d %H:%M:%S"),
            c.info,
            c.success,
            c.warning,
            c.error
        );
    }
    let totals = shared::logger::repository::counts_by_level().await?;
    println!("{} runs, {} entries total", summaries.len(), totals.total());
    Ok(())
}

/// `run-log [run_id]` - all entries of one run; without an id, the
/// orphan entries written outside any run.
async fn show_run_log(run_id: Option<String>) -> anyhow::Result<()> {
    for entry in shared::logger::repository::list_by_run(run_id.as_deref()).await? {
        print_log_entry(&entry);
    }
    Ok(())
}

fn print_log_entry(entry: &contracts::shared::logger::LogEntry) {
    println!(
        "{} [{:>7}] {}{}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.level.code(),
        entry.message,
        entry
            .context
            .as_ref()
            .map(|c| format!("  {c}"))
            .unwrap_or_default()
    );
}

async fn export_logs(path: Option<String>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(|| "sync_logs.csv".to_string());
    let exported = shared::logger::repository::export_csv(std::path::Path::new(&path)).await?;
    tracing::info!("Exported {exported} log entries to {path}");
    Ok(())
}

async fn clear_logs() -> anyhow::Result<()> {
    shared::logger::repository::clear_all().await?;
    tracing::info!("Sync log cleared");
    Ok(())
}
