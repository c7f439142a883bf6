use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::shared::data::db::get_connection;

/// Embedded schema. Every statement is idempotent so startup can apply
/// it unconditionally.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS a001_product (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER,
    sku TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    regular_price REAL,
    sale_price REAL,
    stock_quantity INTEGER,
    in_stock INTEGER NOT NULL DEFAULT 1,
    length REAL,
    width REAL,
    height REAL,
    weight REAL,
    images_json TEXT NOT NULL DEFAULT '[]',
    category_ids_json TEXT NOT NULL DEFAULT '[]',
    meta_json TEXT NOT NULL DEFAULT '{}',
    attributes_json TEXT NOT NULL DEFAULT '{}',
    published INTEGER NOT NULL DEFAULT 1,
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS a001_product_category (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER,
    name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS a002_sales_order (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    remote_order_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'processing',
    delivery_status TEXT,
    payout_status TEXT,
    commission REAL NOT NULL DEFAULT 0,
    fee REAL NOT NULL DEFAULT 0,
    refund_amount REAL,
    collection_id TEXT,
    collection_name TEXT,
    currency TEXT NOT NULL DEFAULT '',
    total REAL NOT NULL DEFAULT 0,
    billing_json TEXT NOT NULL DEFAULT '{}',
    shipping_json TEXT NOT NULL DEFAULT '{}',
    items_json TEXT NOT NULL DEFAULT '[]',
    notes_json TEXT NOT NULL DEFAULT '[]',
    source TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    synced_at TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_a002_sales_order_remote
    ON a002_sales_order (remote_order_id, source);

CREATE TABLE IF NOT EXISTS system_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    level TEXT NOT NULL,
    message TEXT NOT NULL,
    context TEXT,
    run_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_system_log_run_id ON system_log (run_id);

CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Create all tables on first start; a no-op on every later start.
pub async fn apply_schema() -> Result<()> {
    let conn = get_connection();

    for (idx, statement) in SCHEMA.split(';').enumerate() {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            continue;
        }
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("{};", trimmed),
        ))
        .await
        .with_context(|| {
            format!(
                "failed to execute schema statement #{}: {}",
                idx,
                trimmed.lines().next().unwrap_or_default()
            )
        })?;
    }

    tracing::info!("Database schema is up to date");
    Ok(())
}
