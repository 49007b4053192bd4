//! Admin order board — every order in the shop, filterable by status.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::{OrderEvent, OrderStatus};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

use super::OrderSummary;

struct OrderBoardState {
    orders: HashMap<AggregateId, OrderSummary>,
    position: ProjectionPosition,
}

/// Storefront-wide order listing backing the admin views.
#[derive(Clone)]
pub struct OrderBoardView {
    state: Arc<RwLock<OrderBoardState>>,
}

impl OrderBoardView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(OrderBoardState {
                orders: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Returns all orders, optionally filtered by status, newest first.
    pub async fn orders(&self, status: Option<OrderStatus>) -> Vec<OrderSummary> {
        let state = self.state.read().await;
        let mut orders: Vec<OrderSummary> = state
            .orders
            .values()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        orders
    }

    /// Returns the number of orders currently in a given status.
    pub async fn count_in_status(&self, status: OrderStatus) -> usize {
        self.state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.status == status)
            .count()
    }
}

impl Default for OrderBoardView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OrderBoardView {
    fn name(&self) -> &'static str {
        "OrderBoardView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let mut state = self.state.write().await;

        if event.aggregate_type != "Order" {
            state.position = state.position.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
        let order_id = event.aggregate_id;

        match &order_event {
            OrderEvent::OrderPlaced(data) => {
                state.orders.insert(order_id, OrderSummary::from_placed(data));
            }
            other => {
                if let Some(summary) = state.orders.get_mut(&order_id) {
                    summary.fold(other);
                }
            }
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.orders.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for OrderBoardView {
    fn name(&self) -> &'static str {
        "OrderBoardView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.orders.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        DomainEvent, Money, OrderLine, PaymentMethod, ShippingAddress, UserId,
    };

    fn make_envelope(aggregate_id: AggregateId, version: i64, event: &OrderEvent) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Order")
            .event_type(event.event_type())
            .version(event_store::Version::new(version))
            .payload(event)
            .unwrap()
            .build()
    }

    fn placed(order_id: AggregateId) -> OrderEvent {
        OrderEvent::order_placed(
            order_id,
            UserId::new(),
            vec![OrderLine::new("GM-001", 1, Money::from_cents(1000))],
            ShippingAddress {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
            PaymentMethod::Paypal,
            Money::from_cents(1000),
            Money::zero(),
            Money::zero(),
            Money::from_cents(1000),
        )
    }

    async fn place_order(view: &OrderBoardView) -> AggregateId {
        let order_id = AggregateId::new();
        view.handle(&make_envelope(order_id, 1, &placed(order_id)))
            .await
            .unwrap();
        order_id
    }

    #[tokio::test]
    async fn lists_all_orders() {
        let view = OrderBoardView::new();
        place_order(&view).await;
        place_order(&view).await;

        assert_eq!(view.orders(None).await.len(), 2);
    }

    #[tokio::test]
    async fn filters_by_status() {
        let view = OrderBoardView::new();
        let first = place_order(&view).await;
        place_order(&view).await;

        view.handle(&make_envelope(
            first,
            2,
            &OrderEvent::status_changed(OrderStatus::Pending, OrderStatus::Processing),
        ))
        .await
        .unwrap();

        let processing = view.orders(Some(OrderStatus::Processing)).await;
        assert_eq!(processing.len(), 1);
        assert_eq!(processing[0].order_id, first);

        assert_eq!(view.orders(Some(OrderStatus::Pending)).await.len(), 1);
        assert_eq!(view.count_in_status(OrderStatus::Processing).await, 1);
    }

    #[tokio::test]
    async fn paid_flag_updates() {
        let view = OrderBoardView::new();
        let order_id = place_order(&view).await;

        view.handle(&make_envelope(
            order_id,
            2,
            &OrderEvent::order_paid(domain::PaymentCapture {
                reference: "txn-1".to_string(),
                status: "COMPLETED".to_string(),
                payer_email: None,
                captured_at: chrono::Utc::now(),
            }),
        ))
        .await
        .unwrap();

        let orders = view.orders(None).await;
        assert!(orders[0].is_paid);
    }

    #[tokio::test]
    async fn reset_clears_board() {
        let view = OrderBoardView::new();
        place_order(&view).await;

        view.reset().await.unwrap();

        assert!(view.orders(None).await.is_empty());
        assert_eq!(view.position().await.events_processed, 0);
    }
}
