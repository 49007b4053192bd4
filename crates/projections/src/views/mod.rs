//! Read model views.

mod customer_orders;
mod order_board;
mod sales;

pub use customer_orders::CustomerOrdersView;
pub use order_board::OrderBoardView;
pub use sales::{GameSales, SalesView};

use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{Money, OrderEvent, OrderStatus, UserId};
use serde::Serialize;

/// Denormalized order row shared by the order views.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: AggregateId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub line_count: usize,
    pub total_price: Money,
    pub is_paid: bool,
    pub placed_at: DateTime<Utc>,
}

impl OrderSummary {
    /// Folds a follow-up order event into the summary.
    fn fold(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::OrderPlaced(_) => {}
            OrderEvent::OrderPaid(_) => self.is_paid = true,
            OrderEvent::OrderApproved(_) => self.status = OrderStatus::Approved,
            OrderEvent::StatusChanged(data) => self.status = data.to,
            OrderEvent::OrderCancelled(_) => self.status = OrderStatus::Cancelled,
        }
    }

    fn from_placed(data: &domain::order::OrderPlacedData) -> Self {
        Self {
            order_id: data.order_id,
            user_id: data.user_id,
            status: OrderStatus::Pending,
            line_count: data.lines.len(),
            total_price: data.total_price,
            is_paid: false,
            placed_at: data.placed_at,
        }
    }
}
