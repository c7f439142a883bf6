use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use contracts::domain::a002_sales_order::{Address, OrderNote, SalesOrder, SalesOrderId, SalesOrderItem};
use contracts::enums::{DeliveryStatus, OrderStatus, PayoutStatus};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_sales_order")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub remote_order_id: String,
    pub status: String,
    pub delivery_status: Option<String>,
    pub payout_status: Option<String>,
    pub commission: f64,
    pub fee: f64,
    pub refund_amount: Option<f64>,
    pub collection_id: Option<String>,
    pub collection_name: Option<String>,
    pub currency: String,
    pub total: f64,
    pub billing_json: String,
    pub shipping_json: String,
    pub items_json: String,
    pub notes_json: String,
    pub source: String,
    pub created_at: String,
    pub synced_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|n| n.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

impl From<Model> for SalesOrder {
    fn from(m: Model) -> Self {
        let billing: Address = serde_json::from_str(&m.billing_json).unwrap_or_default();
        let shipping: Address = serde_json::from_str(&m.shipping_json).unwrap_or_default();
        let items: Vec<SalesOrderItem> = serde_json::from_str(&m.items_json).unwrap_or_default();
        let notes: Vec<OrderNote> = serde_json::from_str(&m.notes_json).unwrap_or_default();

        SalesOrder {
            id: SalesOrderId(m.id),
            remote_order_id: m.remote_order_id,
            status: OrderStatus::from_code(&m.status).unwrap_or(OrderStatus::Processing),
            delivery_status: m.delivery_status.as_deref().and_then(DeliveryStatus::from_code),
            payout_status: m.payout_status.as_deref().and_then(PayoutStatus::from_code),
            commission: m.commission,
            fee: m.fee,
            refund_amount: m.refund_amount,
            collection_id: m.collection_id,
            collection_name: m.collection_name,
            currency: m.currency,
            total: m.total,
            billing,
            shipping,
            items,
            notes,
            source: m.source,
            created_at: parse_timestamp(&m.created_at),
            synced_at: m.synced_at.as_deref().map(parse_timestamp),
        }
    }
}

fn payout_code(status: PayoutStatus) -> String {
    status.code().to_string()
}

fn to_active_model(order: &SalesOrder) -> Result<ActiveModel> {
    Ok(ActiveModel {
        id: if order.id.value() == 0 {
            sea_orm::ActiveValue::NotSet
        } else {
            Set(order.id.value())
        },
        remote_order_id: Set(order.remote_order_id.clone()),
        status: Set(order.status.code().to_string()),
        delivery_status: Set(order.delivery_status.map(|s| s.code().to_string())),
        payout_status: Set(order.payout_status.map(payout_code)),
        commission: Set(order.commission),
        fee: Set(order.fee),
        refund_amount: Set(order.refund_amount),
        collection_id: Set(order.collection_id.clone()),
        collection_name: Set(order.collection_name.clone()),
        currency: Set(order.currency.clone()),
        total: Set(order.total),
        billing_json: Set(serde_json::to_string(&order.billing)?),
        shipping_json: Set(serde_json::to_string(&order.shipping)?),
        items_json: Set(serde_json::to_string(&order.items)?),
        notes_json: Set(serde_json::to_string(&order.notes)?),
        source: Set(order.source.clone()),
        created_at: Set(format_timestamp(order.created_at)),
        synced_at: Set(order.synced_at.map(format_timestamp)),
    })
}

pub async fn find_by_remote_id(remote_order_id: &str) -> Result<Option<SalesOrder>> {
    let model = Entity::find()
        .filter(Column::RemoteOrderId.eq(remote_order_id))
        .one(get_connection())
        .await?;
    Ok(model.map(Into::into))
}

/// Insert a new order and return its local id.
pub async fn insert(order: &SalesOrder) -> Result<SalesOrderId> {
    let active = to_active_model(order)?;
    let result = Entity::insert(active).exec(get_connection()).await?;
    Ok(SalesOrderId(result.last_insert_id))
}

pub async fn update(order: &SalesOrder) -> Result<()> {
    let active = to_active_model(order)?;
    Entity::update(active).exec(get_connection()).await?;
    Ok(())
}

pub async fn list_recent(limit: u64) -> Result<Vec<SalesOrder>> {
    let models = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(get_connection())
        .await?;
    Ok(models.into_iter().map(Into::into).collect())
}

pub async fn count() -> Result<u64> {
    Ok(Entity::find().count(get_connection()).await?)
}
