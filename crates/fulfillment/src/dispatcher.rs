//! Notification dispatcher: renders and emails order notifications.

use domain::{CatalogStore, Order, OrderStatus};

use crate::receipt::build_receipt;
use crate::services::{
    Attachment, Customer, Email, MailTransport, ReceiptRenderer,
};
use crate::templates;

/// What happened to trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A new account was created.
    Welcome,

    /// An order was just placed.
    OrderConfirmed,

    /// An order entered a new status.
    StatusChanged(OrderStatus),
}

impl NotificationKind {
    /// Returns true if this notification carries a receipt attachment.
    pub fn wants_receipt(&self) -> bool {
        match self {
            NotificationKind::Welcome => false,
            NotificationKind::OrderConfirmed => true,
            NotificationKind::StatusChanged(status) => status.attaches_receipt(),
        }
    }
}

/// Result of a dispatch attempt.
///
/// `delivered` reflects the email step only: a failed receipt render with a
/// successful send is still a delivered notification.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub delivered: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn delivered(message_id: String) -> Self {
        Self {
            delivered: true,
            message_id: Some(message_id),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            delivered: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Renders an email (and optionally a receipt attachment) for an order
/// event and hands it to the transport.
///
/// The one deliberate resilience behavior of this subsystem lives here: a
/// receipt render failure downgrades to an email without the attachment
/// instead of failing the notification. Transport failures are returned in
/// the outcome and logged; nothing is retried or queued.
pub struct NotificationDispatcher<C, M, R>
where
    C: CatalogStore,
    M: MailTransport,
    R: ReceiptRenderer,
{
    catalog: C,
    mailer: M,
    renderer: R,
}

impl<C, M, R> NotificationDispatcher<C, M, R>
where
    C: CatalogStore,
    M: MailTransport,
    R: ReceiptRenderer,
{
    /// Creates a new dispatcher.
    pub fn new(catalog: C, mailer: M, renderer: R) -> Self {
        Self {
            catalog,
            mailer,
            renderer,
        }
    }

    /// Dispatches a notification for the given order and customer.
    #[tracing::instrument(skip(self, order, customer), fields(customer = %customer.email))]
    pub async fn dispatch(
        &self,
        order: &Order,
        customer: &Customer,
        kind: NotificationKind,
    ) -> DispatchOutcome {
        metrics::counter!("notifications_dispatched").increment(1);

        let receipt = build_receipt(order, customer, &self.catalog).await;

        let (subject, html) = match kind {
            NotificationKind::Welcome => templates::welcome_email(&customer.name),
            NotificationKind::OrderConfirmed => templates::order_confirmed_email(&receipt),
            NotificationKind::StatusChanged(status) => {
                templates::status_changed_email(&receipt, status)
            }
        };

        let attachment = if kind.wants_receipt() {
            match self.renderer.render(&receipt).await {
                Ok(bytes) => Some(Attachment {
                    filename: format!(
                        "receipt-{}.{}",
                        receipt.order_id,
                        self.renderer.file_extension()
                    ),
                    content_type: self.renderer.content_type().to_string(),
                    bytes,
                }),
                Err(e) => {
                    // Degrade: the customer still gets the email.
                    metrics::counter!("notifications_render_failures").increment(1);
                    tracing::warn!(error = %e, "receipt rendering failed, sending without attachment");
                    None
                }
            }
        } else {
            None
        };

        let email = Email {
            to: customer.email.clone(),
            subject,
            html,
            text: Some(templates::receipt_text(&receipt)),
            attachment,
        };

        match self.mailer.send(email).await {
            Ok(delivery) => {
                tracing::info!(message_id = %delivery.message_id, "notification delivered");
                DispatchOutcome::delivered(delivery.message_id)
            }
            Err(e) => {
                metrics::counter!("notifications_transport_failures").increment(1);
                tracing::warn!(error = %e, "notification delivery failed");
                DispatchOutcome::failed(e.to_string())
            }
        }
    }
}
