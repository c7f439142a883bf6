//! Pure reconciliation of fetched marketplace orders against the local
//! order book. No IO happens here; the executor feeds data in and
//! persists what comes out.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use contracts::domain::a001_product::Product;
use contracts::domain::a002_sales_order::{
    Address, OrderNote, SalesOrder, SalesOrderId, SalesOrderItem,
};
use contracts::enums::{DeliveryStatus, PayoutStatus};

use crate::domain::a001_product::service::resolve_by_gtin;
use crate::shared::format::format_amount;

use crate::usecases::u102_order_import::nalda_api_client::{NaldaOrder, NaldaOrderItem};

/// Display name for a line that could not be matched to any product.
pub const UNLINKED_ITEM_NAME: &str = "Nalda Item";

/// Group fetched items by their order id. Items referencing an order
/// that was not fetched are simply never consumed.
pub fn group_items(items: Vec<NaldaOrderItem>) -> HashMap<i64, Vec<NaldaOrderItem>> {
    let mut grouped: HashMap<i64, Vec<NaldaOrderItem>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }
    grouped
}

/// Order-level delivery status is taken from the first item; orders
/// with no items default to IN_PREPARATION.
pub fn order_delivery_status(items: &[NaldaOrderItem]) -> DeliveryStatus {
    items
        .first()
        .and_then(|i| i.delivery_status.as_deref())
        .and_then(DeliveryStatus::from_code)
        .unwrap_or(DeliveryStatus::InPreparation)
}

fn parse_created_at(raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    fallback
}

fn build_address(order: &NaldaOrder) -> Address {
    Address {
        first_name: order.first_name.clone(),
        last_name: order.last_name.clone(),
        street: order.street1.clone(),
        city: order.city.clone(),
        postcode: order.postal_code.clone(),
        country: order.country.clone(),
        email: order.email.clone(),
    }
}

fn build_item(item: &NaldaOrderItem, products: &[Product]) -> SalesOrderItem {
    let matched = resolve_by_gtin(products, &item.gtin);
    let name = if !item.title.trim().is_empty() {
        item.title.clone()
    } else if let Some(product) = matched {
        product.name.clone()
    } else {
        UNLINKED_ITEM_NAME.to_string()
    };
    SalesOrderItem {
        product_id: matched.map(|p| p.id.value()),
        gtin: item.gtin.clone(),
        name,
        quantity: item.quantity,
        price: item.price,
        condition: item.condition.clone(),
        delivery_status: item
            .delivery_status
            .as_deref()
            .and_then(DeliveryStatus::from_code),
        delivery_date_planned: item.delivery_date_planned.clone(),
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

/// Assemble a new local order from a fetched one. Billing mirrors
/// shipping because the marketplace sends a single address.
pub fn build_order(
    order: &NaldaOrder,
    items: &[NaldaOrderItem],
    products: &[Product],
    source: &str,
    currency: &str,
    now: DateTime<Utc>,
) -> SalesOrder {
    let delivery_status = order_delivery_status(items);
    let address = build_address(order);
    let order_items: Vec<SalesOrderItem> =
        items.iter().map(|i| build_item(i, products)).collect();
    let total = order_items.iter().map(|i| i.price).sum();

    SalesOrder {
        id: SalesOrderId(0),
        remote_order_id: order.order_id.to_string(),
        status: delivery_status.to_order_status(),
        delivery_status: Some(delivery_status),
        payout_status: PayoutStatus::from_code(&order.payout_status),
        commission: order.commission,
        fee: order.fee,
        refund_amount: (order.refund > 0.0).then_some(order.refund),
        collection_id: optional(&order.collection_id),
        collection_name: optional(&order.collection_name),
        currency: currency.to_string(),
        total,
        billing: address.clone(),
        shipping: address,
        items: order_items,
        notes: vec![OrderNote {
            created_at: now,
            content: format!(
                "Order imported from Nalda Marketplace. Nalda Order ID: {}",
                order.order_id
            ),
        }],
        source: source.to_string(),
        created_at: parse_created_at(&order.created_at, now),
        synced_at: Some(now),
    }
}

/// Refresh an existing order from a fetched one. Returns the updated
/// order and the human-readable list of detected changes; an empty list
/// means only the sync timestamp (and silently refreshed commission and
/// fee) moved.
pub fn reconcile(
    existing: &SalesOrder,
    order: &NaldaOrder,
    items: &[NaldaOrderItem],
    now: DateTime<Utc>,
) -> (SalesOrder, Vec<String>) {
    let mut updated = existing.clone();
    let mut changes = Vec::new();

    let new_delivery = order_delivery_status(items);
    if existing.delivery_status != Some(new_delivery) {
        let old = existing
            .delivery_status
            .map(|s| s.code())
            .unwrap_or("NONE");
        changes.push(format!("Delivery status: {} → {}", old, new_delivery.code()));
        updated.delivery_status = Some(new_delivery);
        updated.status = new_delivery.to_order_status();
    }

    let new_payout = PayoutStatus::from_code(&order.payout_status);
    if new_payout.is_some() && existing.payout_status != new_payout {
        let old = existing.payout_status.map(|s| s.code()).unwrap_or("NONE");
        let new = new_payout.map(|s| s.code()).unwrap_or("NONE");
        changes.push(format!("Payout status: {} → {}", old, new));
        updated.payout_status = new_payout;
    }

    if order.refund > 0.0 {
        let differs = match existing.refund_amount {
            Some(current) => (current - order.refund).abs() > f64::EPSILON,
            None => true,
        };
        if differs {
            changes.push(format!("Refund amount: {}", format_amount(order.refund)));
            updated.refund_amount = Some(order.refund);
        }
    }

    // Commission and fee track the marketplace without generating noise.
    updated.commission = order.commission;
    updated.fee = order.fee;
    updated.synced_at = Some(now);

    if !changes.is_empty() {
        updated.notes.push(OrderNote {
            created_at: now,
            content: format!(
                "Order updated from Nalda sync. Changes: {}",
                changes.join("; ")
            ),
        });
    }

    (updated, changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contracts::domain::a001_product::ProductId;
    use contracts::enums::OrderStatus;

    fn nalda_order(id: i64) -> NaldaOrder {
        NaldaOrder {
            order_id: id,
            first_name: "Eva".into(),
            last_name: "Muster".into(),
            email: "eva@example.test".into(),
            street1: "Hauptstrasse 1".into(),
            city: "Bern".into(),
            postal_code: "3000".into(),
            country: "CH".into(),
            created_at: "2025-03-07 10:00:00".into(),
            payout_status: "OPEN".into(),
            commission: 2.5,
            fee: 0.3,
            collection_id: None,
            collection_name: None,
            refund: 0.0,
        }
    }

    fn nalda_item(order_id: i64, gtin: &str, status: &str) -> NaldaOrderItem {
        NaldaOrderItem {
            order_id,
            gtin: gtin.into(),
            title: "Blue Pen".into(),
            quantity: 2,
            price: 25.0,
            condition: Some("new".into()),
            delivery_status: Some(status.into()),
            delivery_date_planned: None,
        }
    }

    fn product(id: i64, sku: &str) -> Product {
        Product {
            id: ProductId(id),
            parent_id: None,
            sku: sku.into(),
            name: "Blue Pen".into(),
            description: String::new(),
            regular_price: Some(12.5),
            sale_price: None,
            stock_quantity: Some(10),
            in_stock: true,
            length: None,
            width: None,
            height: None,
            weight: None,
            images: vec![],
            category_ids: vec![],
            meta: Default::default(),
            attributes: Default::default(),
            published: true,
            updated_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn items_group_by_order_and_orphans_stay_unconsumed() {
        let grouped = group_items(vec![
            nalda_item(1, "a", "DELIVERED"),
            nalda_item(2, "b", "IN_DELIVERY"),
            nalda_item(1, "c", "DELIVERED"),
            nalda_item(99, "orphan", "DELIVERED"),
        ]);
        assert_eq!(grouped.get(&1).map(Vec::len), Some(2));
        assert_eq!(grouped.get(&2).map(Vec::len), Some(1));
        // The orphan sits under its own key; orders that were never
        // fetched simply never look it up.
        assert_eq!(grouped.get(&99).map(Vec::len), Some(1));
    }

    #[test]
    fn delivery_status_defaults_when_items_are_missing() {
        assert_eq!(order_delivery_status(&[]), DeliveryStatus::InPreparation);
        let items = vec![
            nalda_item(1, "a", "IN_DELIVERY"),
            nalda_item(1, "b", "DELIVERED"),
        ];
        // First item wins.
        assert_eq!(order_delivery_status(&items), DeliveryStatus::InDelivery);
    }

    #[test]
    fn built_order_mirrors_shipping_into_billing_and_totals_items() {
        let items = vec![nalda_item(7, "4006381333931", "IN_PREPARATION")];
        let products = vec![product(42, "4006381333931")];
        let order = build_order(&nalda_order(7), &items, &products, "nalda", "CHF", now());

        assert_eq!(order.remote_order_id, "7");
        assert_eq!(order.billing, order.shipping);
        assert_eq!(order.shipping.street, "Hauptstrasse 1");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total, 25.0);
        assert_eq!(order.items[0].product_id, Some(42));
        assert_eq!(order.created_at, Utc.with_ymd_and_hms(2025, 3, 7, 10, 0, 0).unwrap());
        assert!(order.notes[0].content.contains("Nalda Order ID: 7"));
    }

    #[test]
    fn unmatched_item_falls_back_to_placeholder_name() {
        let mut item = nalda_item(7, "0000000000000", "IN_PREPARATION");
        item.title = String::new();
        let order = build_order(&nalda_order(7), &[item], &[], "nalda", "CHF", now());
        assert_eq!(order.items[0].product_id, None);
        assert_eq!(order.items[0].name, UNLINKED_ITEM_NAME);
    }

    #[test]
    fn reconcile_without_changes_only_refreshes_sync_fields() {
        let items = vec![nalda_item(7, "4006381333931", "IN_PREPARATION")];
        let products = vec![product(42, "4006381333931")];
        let existing = build_order(&nalda_order(7), &items, &products, "nalda", "CHF", now());
        let note_count = existing.notes.len();

        let later = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
        let mut fetched = nalda_order(7);
        fetched.commission = 2.6;
        let (updated, changes) = reconcile(&existing, &fetched, &items, later);

        assert!(changes.is_empty());
        assert_eq!(updated.notes.len(), note_count);
        assert_eq!(updated.synced_at, Some(later));
        // Commission tracks silently.
        assert_eq!(updated.commission, 2.6);
    }

    #[test]
    fn delivery_change_updates_status_and_writes_note() {
        let initial_items = vec![nalda_item(7, "a", "IN_PREPARATION")];
        let existing = build_order(&nalda_order(7), &initial_items, &[], "nalda", "CHF", now());

        let delivered = vec![nalda_item(7, "a", "DELIVERED")];
        let (updated, changes) = reconcile(&existing, &nalda_order(7), &delivered, now());

        assert_eq!(
            changes,
            vec!["Delivery status: IN_PREPARATION → DELIVERED".to_string()]
        );
        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(updated.delivery_status, Some(DeliveryStatus::Delivered));
        let note = updated.notes.last().unwrap();
        assert_eq!(
            note.content,
            "Order updated from Nalda sync. Changes: Delivery status: IN_PREPARATION → DELIVERED"
        );
    }

    #[test]
    fn refund_notes_only_on_real_change() {
        let items = vec![nalda_item(7, "a", "IN_PREPARATION")];
        let existing = build_order(&nalda_order(7), &items, &[], "nalda", "CHF", now());

        let mut refunded = nalda_order(7);
        refunded.refund = 10.5;
        let (updated, changes) = reconcile(&existing, &refunded, &items, now());
        assert_eq!(changes, vec!["Refund amount: 10.5".to_string()]);
        assert_eq!(updated.refund_amount, Some(10.5));

        // Same refund again produces no new note.
        let (_, changes) = reconcile(&updated, &refunded, &items, now());
        assert!(changes.is_empty());
    }

    #[test]
    fn payout_change_is_reported() {
        let items = vec![nalda_item(7, "a", "IN_PREPARATION")];
        let existing = build_order(&nalda_order(7), &items, &[], "nalda", "CHF", now());

        let mut paid = nalda_order(7);
        paid.payout_status = "PAID_OUT".into();
        let (updated, changes) = reconcile(&existing, &paid, &items, now());
        assert_eq!(changes, vec!["Payout status: OPEN → PAID_OUT".to_string()]);
        assert_eq!(updated.payout_status, Some(PayoutStatus::PaidOut));

        // Unknown payout strings are ignored rather than clearing state.
        let mut odd = nalda_order(7);
        odd.payout_status = "SOMETHING".into();
        let (kept, changes) = reconcile(&updated, &odd, &items, now());
        assert!(changes.is_empty());
        assert_eq!(kept.payout_status, Some(PayoutStatus::PaidOut));
    }
}
