//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::value_objects::{
    AdminStamp, Money, OrderLine, PaymentCapture, PaymentMethod, ShippingAddress, UserId,
};

use super::{
    OrderError, OrderEvent, OrderStatus,
    events::{OrderApprovedData, OrderPaidData, OrderPlacedData, StatusChangedData},
};

/// Totals computed by the pricing policy at placement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

/// Order aggregate root.
///
/// Lines, address, and totals are frozen by the `OrderPlaced` event and
/// never change afterward; only the status, payment, and approval fields
/// mutate. Status changes must follow [`OrderStatus::can_transition_to`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The customer who placed the order.
    user_id: Option<UserId>,

    /// Frozen lines.
    lines: Vec<OrderLine>,

    shipping_address: Option<ShippingAddress>,
    payment_method: Option<PaymentMethod>,

    /// Current fulfillment status.
    status: OrderStatus,

    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_capture: Option<PaymentCapture>,

    approved_at: Option<DateTime<Utc>>,
    approved_by: Option<AdminStamp>,

    delivered_at: Option<DateTime<Utc>>,
    cancelled_reason: Option<String>,

    subtotal: Money,
    tax: Money,
    shipping_fee: Money,
    total_price: Money,

    placed_at: Option<DateTime<Utc>>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => self.apply_placed(data),
            OrderEvent::OrderPaid(data) => self.apply_paid(data),
            OrderEvent::OrderApproved(data) => self.apply_approved(data),
            OrderEvent::StatusChanged(data) => self.apply_status_changed(data),
            OrderEvent::OrderCancelled(data) => {
                self.status = OrderStatus::Cancelled;
                self.cancelled_reason = Some(data.reason);
            }
        }
    }
}

// Query methods
impl Order {
    /// Returns the customer's ID.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the frozen order lines.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    /// Returns the payment method.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Returns true once payment was recorded.
    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    /// Returns when payment was recorded.
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Returns the gateway capture record.
    pub fn payment_capture(&self) -> Option<&PaymentCapture> {
        self.payment_capture.as_ref()
    }

    /// Returns when the order was approved.
    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    /// Returns who approved the order.
    pub fn approved_by(&self) -> Option<&AdminStamp> {
        self.approved_by.as_ref()
    }

    /// Returns when the order was delivered.
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Returns why the order was cancelled, if it was.
    pub fn cancelled_reason(&self) -> Option<&str> {
        self.cancelled_reason.as_deref()
    }

    /// Returns the sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Returns the tax frozen at placement.
    pub fn tax(&self) -> Money {
        self.tax
    }

    /// Returns the shipping fee frozen at placement.
    pub fn shipping_fee(&self) -> Money {
        self.shipping_fee
    }

    /// Returns the frozen grand total.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns when the order was placed.
    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }
}

// Command methods (return events)
impl Order {
    /// Places the order, freezing lines and totals.
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        &self,
        order_id: AggregateId,
        user_id: UserId,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        totals: OrderTotals,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }
        if lines.is_empty() {
            return Err(OrderError::NoLines);
        }

        Ok(vec![OrderEvent::order_placed(
            order_id,
            user_id,
            lines,
            shipping_address,
            payment_method,
            totals.subtotal,
            totals.tax,
            totals.shipping_fee,
            totals.total,
        )])
    }

    /// Records a payment capture from the gateway.
    pub fn pay(&self, capture: PaymentCapture) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        if self.is_paid {
            return Err(OrderError::AlreadyPaid);
        }

        Ok(vec![OrderEvent::order_paid(capture)])
    }

    /// Approves the order, stamping the approving admin.
    pub fn approve(&self, approved_by: AdminStamp) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        if !self.status.can_transition_to(OrderStatus::Approved) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Approved,
            });
        }

        Ok(vec![OrderEvent::order_approved(approved_by)])
    }

    /// Moves the order to a new status along the transition table.
    ///
    /// Asking for the current status emits nothing. Asking for `Cancelled`
    /// goes through [`Order::cancel`] so a reason is captured.
    pub fn transition_to(&self, to: OrderStatus) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        if to == self.status {
            return Ok(vec![]);
        }
        if !self.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        Ok(vec![OrderEvent::status_changed(self.status, to)])
    }

    /// Cancels the order with a reason.
    pub fn cancel(
        &self,
        reason: impl Into<String>,
        cancelled_by: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        if !self.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Cancelled,
            });
        }

        Ok(vec![OrderEvent::order_cancelled(reason, cancelled_by)])
    }
}

// Apply helpers
impl Order {
    fn apply_placed(&mut self, data: OrderPlacedData) {
        self.id = Some(data.order_id);
        self.user_id = Some(data.user_id);
        self.lines = data.lines;
        self.shipping_address = Some(data.shipping_address);
        self.payment_method = Some(data.payment_method);
        self.subtotal = data.subtotal;
        self.tax = data.tax;
        self.shipping_fee = data.shipping_fee;
        self.total_price = data.total_price;
        self.placed_at = Some(data.placed_at);
        self.status = OrderStatus::Pending;
    }

    fn apply_paid(&mut self, data: OrderPaidData) {
        self.is_paid = true;
        self.paid_at = Some(data.paid_at);
        self.payment_capture = Some(data.capture);
    }

    fn apply_approved(&mut self, data: OrderApprovedData) {
        self.status = OrderStatus::Approved;
        self.approved_at = Some(data.approved_at);
        self.approved_by = Some(data.approved_by);
    }

    fn apply_status_changed(&mut self, data: StatusChangedData) {
        self.status = data.to;
        if data.to == OrderStatus::Delivered {
            self.delivered_at = Some(data.changed_at);
        }
    }
}
