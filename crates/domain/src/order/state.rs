//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The fulfillment status of an order.
///
/// Transitions:
/// ```text
/// Pending ──► Processing ──► Approved ──► Shipped ──► Delivered
///    │             │             │            │
///    └─────────────┴─────────────┴────────────┴──► Cancelled
/// ```
///
/// The table is closed: a status update naming any other pair is rejected,
/// it cannot be skipped past or rewound by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order placed, awaiting fulfillment.
    #[default]
    Pending,

    /// Payment confirmed, order is being prepared.
    Processing,

    /// An admin signed off on the order.
    Approved,

    /// Handed to the carrier.
    Shipped,

    /// Arrived at the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order may move from `self` to `to`.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Processing)
                | (Processing, Approved)
                | (Approved, Shipped)
                | (Shipped, Delivered)
        ) || (!self.is_terminal() && to == Cancelled)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if a status-changed notification should be sent when
    /// entering this state.
    pub fn notifies(&self) -> bool {
        matches!(
            self,
            OrderStatus::Processing
                | OrderStatus::Approved
                | OrderStatus::Shipped
                | OrderStatus::Delivered
        )
    }

    /// Returns true if notifications for this state carry a receipt.
    pub fn attaches_receipt(&self) -> bool {
        matches!(
            self,
            OrderStatus::Approved | OrderStatus::Shipped | OrderStatus::Delivered
        )
    }

    /// Returns the status name as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Approved => "approved",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "approved" => Ok(OrderStatus::Approved),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}
