//! Order service providing a persistence-aware API over the order aggregate.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::value_objects::{
    AdminStamp, OrderLine, PaymentCapture, PaymentMethod, ShippingAddress, UserId,
};

use super::{Order, OrderStatus, OrderTotals};

/// Service for persisting order commands.
///
/// Thin wrapper over the command handler; authorization and notification
/// policy live a layer up in the fulfillment crate.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
}

impl<S: EventStore> OrderService<S> {
    /// Creates a new order service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Places a new order with frozen lines and totals.
    #[tracing::instrument(skip(self, lines, shipping_address))]
    pub async fn place_order(
        &self,
        order_id: AggregateId,
        user_id: UserId,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        totals: OrderTotals,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(order_id, |order| {
                order.place(
                    order_id,
                    user_id,
                    lines,
                    shipping_address,
                    payment_method,
                    totals,
                )
            })
            .await
    }

    /// Records a payment capture on an order.
    #[tracing::instrument(skip(self, capture))]
    pub async fn pay_order(
        &self,
        order_id: AggregateId,
        capture: PaymentCapture,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(order_id, |order| order.pay(capture))
            .await
    }

    /// Approves an order, stamping the approving admin.
    #[tracing::instrument(skip(self))]
    pub async fn approve_order(
        &self,
        order_id: AggregateId,
        approved_by: AdminStamp,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(order_id, |order| order.approve(approved_by))
            .await
    }

    /// Moves an order to a new status along the transition table.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        order_id: AggregateId,
        to: OrderStatus,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(order_id, |order| order.transition_to(to))
            .await
    }

    /// Cancels an order with a reason.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: AggregateId,
        reason: &str,
        cancelled_by: Option<String>,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(order_id, |order| order.cancel(reason, cancelled_by))
            .await
    }

    /// Loads an order by ID, or None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id).await
    }
}
