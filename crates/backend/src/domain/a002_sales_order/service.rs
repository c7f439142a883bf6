use anyhow::Result;
use contracts::domain::a002_sales_order::{SalesOrder, SalesOrderId};

use super::repository;

pub async fn find_by_remote_id(remote_order_id: &str) -> Result<Option<SalesOrder>> {
    repository::find_by_remote_id(remote_order_id).await
}

/// Persist a new imported order.
pub async fn create(order: &SalesOrder) -> Result<SalesOrderId> {
    repository::insert(order).await
}

/// Persist a reconciled order.
pub async fn save(order: &SalesOrder) -> Result<()> {
    repository::update(order).await
}

pub async fn list_recent(limit: u64) -> Result<Vec<SalesOrder>> {
    repository::list_recent(limit).await
}

pub async fn count_imported() -> Result<u64> {
    repository::count().await
}
