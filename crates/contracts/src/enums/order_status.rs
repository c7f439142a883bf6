use serde::{Deserialize, Serialize};

/// Per-item delivery status as reported by the Nalda marketplace API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    InPreparation,
    InDelivery,
    Delivered,
    Undeliverable,
    Cancelled,
    ReadyToCollect,
    Collected,
    NotPickedUp,
    Returned,
    Dispute,
}

impl DeliveryStatus {
    pub fn code(&self) -> &'static str {
        match self {
            DeliveryStatus::InPreparation => "IN_PREPARATION",
            DeliveryStatus::InDelivery => "IN_DELIVERY",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Undeliverable => "UNDELIVERABLE",
            DeliveryStatus::Cancelled => "CANCELLED",
            DeliveryStatus::ReadyToCollect => "READY_TO_COLLECT",
            DeliveryStatus::Collected => "COLLECTED",
            DeliveryStatus::NotPickedUp => "NOT_PICKED_UP",
            DeliveryStatus::Returned => "RETURNED",
            DeliveryStatus::Dispute => "DISPUTE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "IN_PREPARATION" => Some(DeliveryStatus::InPreparation),
            "IN_DELIVERY" => Some(DeliveryStatus::InDelivery),
            "DELIVERED" => Some(DeliveryStatus::Delivered),
            "UNDELIVERABLE" => Some(DeliveryStatus::Undeliverable),
            "CANCELLED" => Some(DeliveryStatus::Cancelled),
            "READY_TO_COLLECT" => Some(DeliveryStatus::ReadyToCollect),
            "COLLECTED" => Some(DeliveryStatus::Collected),
            "NOT_PICKED_UP" => Some(DeliveryStatus::NotPickedUp),
            "RETURNED" => Some(DeliveryStatus::Returned),
            "DISPUTE" => Some(DeliveryStatus::Dispute),
            _ => None,
        }
    }

    pub fn all() -> Vec<DeliveryStatus> {
        vec![
            DeliveryStatus::InPreparation,
            DeliveryStatus::InDelivery,
            DeliveryStatus::Delivered,
            DeliveryStatus::Undeliverable,
            DeliveryStatus::Cancelled,
            DeliveryStatus::ReadyToCollect,
            DeliveryStatus::Collected,
            DeliveryStatus::NotPickedUp,
            DeliveryStatus::Returned,
            DeliveryStatus::Dispute,
        ]
    }

    /// Map a marketplace delivery status to the local order status.
    /// The mapping is intentionally many-to-one.
    pub fn to_order_status(&self) -> OrderStatus {
        match self {
            DeliveryStatus::InPreparation
            | DeliveryStatus::InDelivery
            | DeliveryStatus::ReadyToCollect => OrderStatus::Processing,
            DeliveryStatus::Delivered | DeliveryStatus::Collected => OrderStatus::Completed,
            DeliveryStatus::Undeliverable | DeliveryStatus::NotPickedUp => OrderStatus::Failed,
            DeliveryStatus::Cancelled => OrderStatus::Cancelled,
            DeliveryStatus::Returned => OrderStatus::Refunded,
            DeliveryStatus::Dispute => OrderStatus::OnHold,
        }
    }

    /// Map an arbitrary status string; unknown statuses fall open to Processing.
    pub fn map_code_to_order_status(code: &str) -> OrderStatus {
        Self::from_code(code)
            .map(|s| s.to_order_status())
            .unwrap_or(OrderStatus::Processing)
    }
}

/// Local order status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::OnHold => "on-hold",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "on-hold" => Some(OrderStatus::OnHold),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }

    pub fn all() -> Vec<OrderStatus> {
        vec![
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::OnHold,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
            OrderStatus::Failed,
        ]
    }

    /// Inverse of [`DeliveryStatus::to_order_status`]. Lossy: picks one
    /// representative delivery status per local status.
    pub fn to_delivery_status(&self) -> DeliveryStatus {
        match self {
            OrderStatus::Pending | OrderStatus::Processing => DeliveryStatus::InPreparation,
            OrderStatus::OnHold => DeliveryStatus::Dispute,
            OrderStatus::Completed => DeliveryStatus::Delivered,
            OrderStatus::Cancelled => DeliveryStatus::Cancelled,
            OrderStatus::Refunded => DeliveryStatus::Returned,
            OrderStatus::Failed => DeliveryStatus::Undeliverable,
        }
    }
}

/// Payout status of a marketplace order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Open,
    PaidOut,
    PartiallyPaidOut,
    Error,
}

impl PayoutStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PayoutStatus::Open => "OPEN",
            PayoutStatus::PaidOut => "PAID_OUT",
            PayoutStatus::PartiallyPaidOut => "PARTIALLY_PAID_OUT",
            PayoutStatus::Error => "ERROR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "OPEN" => Some(PayoutStatus::Open),
            "PAID_OUT" => Some(PayoutStatus::PaidOut),
            "PARTIALLY_PAID_OUT" => Some(PayoutStatus::PartiallyPaidOut),
            "ERROR" => Some(PayoutStatus::Error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_status_mapping_is_total() {
        for status in DeliveryStatus::all() {
            // Every enumerated delivery status maps to some local status.
            let _ = status.to_order_status();
        }
    }

    #[test]
    fn every_target_status_is_reachable() {
        let targets: Vec<OrderStatus> = DeliveryStatus::all()
            .iter()
            .map(|s| s.to_order_status())
            .collect();
        for expected in [
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
            OrderStatus::OnHold,
        ] {
            assert!(targets.contains(&expected), "{:?} unreachable", expected);
        }
    }

    #[test]
    fn inverse_mapping_is_total_but_not_identity() {
        for status in OrderStatus::all() {
            let _ = status.to_delivery_status();
        }
        // COLLECTED -> completed -> DELIVERED: round trip is lossy by design.
        assert_eq!(
            DeliveryStatus::Collected.to_order_status().to_delivery_status(),
            DeliveryStatus::Delivered
        );
    }

    #[test]
    fn unknown_delivery_status_falls_open_to_processing() {
        assert_eq!(
            DeliveryStatus::map_code_to_order_status("SOMETHING_NEW"),
            OrderStatus::Processing
        );
        assert_eq!(
            DeliveryStatus::map_code_to_order_status("RETURNED"),
            OrderStatus::Refunded
        );
    }

    #[test]
    fn codes_round_trip() {
        for status in DeliveryStatus::all() {
            assert_eq!(DeliveryStatus::from_code(status.code()), Some(status));
        }
        for status in OrderStatus::all() {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
    }
}
