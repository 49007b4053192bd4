//! Order aggregate and related types.

mod aggregate;
mod events;
mod service;
mod state;

pub use aggregate::{Order, OrderTotals};
pub use events::{
    OrderApprovedData, OrderCancelledData, OrderEvent, OrderPaidData, OrderPlacedData,
    StatusChangedData,
};
pub use service::OrderService;
pub use state::OrderStatus;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order stream has no OrderPlaced event yet.
    #[error("Order has not been placed")]
    NotPlaced,

    /// An order can only be placed once.
    #[error("Order already placed")]
    AlreadyPlaced,

    /// An order cannot be placed without lines.
    #[error("Order has no lines")]
    NoLines,

    /// The requested status change is not on the transition table.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Payment was already recorded for this order.
    #[error("Order is already paid")]
    AlreadyPaid,
}
