use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{DeliveryStatus, OrderStatus, PayoutStatus};

/// Local sales order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SalesOrderId(pub i64);

impl SalesOrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for SalesOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Postal address attached to an order. The marketplace only sends one
/// address per order; billing mirrors shipping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
    pub email: String,
}

/// Free-text note recorded against an order during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNote {
    pub created_at: DateTime<Utc>,
    pub content: String,
}

/// Line item of a sales order. `product_id` is None when the item could
/// not be matched to a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderItem {
    pub product_id: Option<i64>,
    pub gtin: String,
    pub name: String,
    pub quantity: i64,
    /// Line amount, tax inclusive, exactly as sent by the marketplace.
    pub price: f64,
    pub condition: Option<String>,
    pub delivery_status: Option<DeliveryStatus>,
    pub delivery_date_planned: Option<String>,
}

/// Sales order imported from the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub id: SalesOrderId,
    /// Marketplace-side order id, unique per source.
    pub remote_order_id: String,
    pub status: OrderStatus,
    pub delivery_status: Option<DeliveryStatus>,
    pub payout_status: Option<PayoutStatus>,
    pub commission: f64,
    pub fee: f64,
    pub refund_amount: Option<f64>,
    pub collection_id: Option<String>,
    pub collection_name: Option<String>,
    pub currency: String,
    pub total: f64,
    pub billing: Address,
    pub shipping: Address,
    pub items: Vec<SalesOrderItem>,
    pub notes: Vec<OrderNote>,
    /// Tag identifying where this order came from.
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl SalesOrder {
    /// Order total derived from item line amounts. The marketplace sends
    /// tax inclusive amounts, so no tax is recomputed here.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|i| i.price).sum()
    }
}
