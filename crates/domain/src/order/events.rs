//! Order domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{
    AdminStamp, Money, OrderLine, PaymentCapture, PaymentMethod, ShippingAddress, UserId,
};

use super::OrderStatus;

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// The order was placed from a cart; lines and totals are frozen here.
    OrderPlaced(OrderPlacedData),

    /// The payment gateway confirmed payment.
    OrderPaid(OrderPaidData),

    /// An admin approved the order.
    OrderApproved(OrderApprovedData),

    /// The fulfillment status moved along the transition table.
    StatusChanged(StatusChangedData),

    /// The order was cancelled.
    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::OrderPaid(_) => "OrderPaid",
            OrderEvent::OrderApproved(_) => "OrderApproved",
            OrderEvent::StatusChanged(_) => "StatusChanged",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

/// Data for OrderPlaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    /// The order ID.
    pub order_id: AggregateId,

    /// The customer who placed the order.
    pub user_id: UserId,

    /// Frozen order lines.
    pub lines: Vec<OrderLine>,

    /// Where the order ships.
    pub shipping_address: ShippingAddress,

    /// How the customer pays.
    pub payment_method: PaymentMethod,

    /// Sum of line totals.
    pub subtotal: Money,

    /// Tax computed at placement.
    pub tax: Money,

    /// Shipping fee computed at placement.
    pub shipping_fee: Money,

    /// subtotal + tax + shipping, frozen forever.
    pub total_price: Money,

    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

/// Data for OrderPaid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaidData {
    /// Gateway correlation record.
    pub capture: PaymentCapture,

    /// When payment was recorded here.
    pub paid_at: DateTime<Utc>,
}

/// Data for OrderApproved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderApprovedData {
    /// When the order was approved.
    pub approved_at: DateTime<Utc>,

    /// The admin who approved it.
    pub approved_by: AdminStamp,
}

/// Data for StatusChanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedData {
    /// Status before the change.
    pub from: OrderStatus,

    /// Status after the change.
    pub to: OrderStatus,

    /// When the status changed.
    pub changed_at: DateTime<Utc>,
}

/// Data for OrderCancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    /// When the order was cancelled.
    pub cancelled_at: DateTime<Utc>,

    /// Why it was cancelled.
    pub reason: String,

    /// Who cancelled it.
    pub cancelled_by: Option<String>,
}

// Convenience constructors
impl OrderEvent {
    /// Creates an OrderPlaced event.
    #[allow(clippy::too_many_arguments)]
    pub fn order_placed(
        order_id: AggregateId,
        user_id: UserId,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        subtotal: Money,
        tax: Money,
        shipping_fee: Money,
        total_price: Money,
    ) -> Self {
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            user_id,
            lines,
            shipping_address,
            payment_method,
            subtotal,
            tax,
            shipping_fee,
            total_price,
            placed_at: Utc::now(),
        })
    }

    /// Creates an OrderPaid event.
    pub fn order_paid(capture: PaymentCapture) -> Self {
        OrderEvent::OrderPaid(OrderPaidData {
            capture,
            paid_at: Utc::now(),
        })
    }

    /// Creates an OrderApproved event.
    pub fn order_approved(approved_by: AdminStamp) -> Self {
        OrderEvent::OrderApproved(OrderApprovedData {
            approved_at: Utc::now(),
            approved_by,
        })
    }

    /// Creates a StatusChanged event.
    pub fn status_changed(from: OrderStatus, to: OrderStatus) -> Self {
        OrderEvent::StatusChanged(StatusChangedData {
            from,
            to,
            changed_at: Utc::now(),
        })
    }

    /// Creates an OrderCancelled event.
    pub fn order_cancelled(reason: impl Into<String>, cancelled_by: Option<String>) -> Self {
        OrderEvent::OrderCancelled(OrderCancelledData {
            cancelled_at: Utc::now(),
            reason: reason.into(),
            cancelled_by,
        })
    }
}
