use anyhow::Result;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, Set};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::shared::data::db::get_connection;

pub const LAST_PRODUCT_SYNC: &str = "last_product_sync";
pub const LAST_ORDER_IMPORT: &str = "last_order_import";
pub const LAST_LOG_CLEANUP: &str = "last_log_cleanup";
pub const NEXT_PRODUCT_SYNC: &str = "next_product_sync";
pub const NEXT_ORDER_IMPORT: &str = "next_order_import";
pub const SYNC_RUNNING: &str = "sync_running";

/// Key-value store for sync bookkeeping: last-run snapshots, schedule
/// cursors and the advisory running flag.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_state")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get(key: &str) -> Result<Option<String>> {
    let model = Entity::find_by_id(key.to_string()).one(conn()).await?;
    Ok(model.map(|m| m.value))
}

pub async fn set(key: &str, value: &str) -> Result<()> {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    let active = ActiveModel {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
        updated_at: Set(now),
    };
    Entity::insert(active)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(Column::Key)
                .update_columns([Column::Value, Column::UpdatedAt])
                .to_owned(),
        )
        .exec(conn())
        .await?;
    Ok(())
}

pub async fn remove(key: &str) -> Result<()> {
    Entity::delete_by_id(key.to_string()).exec(conn()).await?;
    Ok(())
}

pub async fn get_json<T: DeserializeOwned>(key: &str) -> Result<Option<T>> {
    match get(key).await? {
        Some(raw) => Ok(serde_json::from_str(&raw).ok()),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize>(key: &str, value: &T) -> Result<()> {
    set(key, &serde_json::to_string(value)?).await
}
