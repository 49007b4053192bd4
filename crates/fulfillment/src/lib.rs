//! Order placement and fulfillment for GameBazaar.
//!
//! The [`OrderLifecycle`] coordinator turns a cart into an order: it
//! validates stock, reserves units through the catalog's conditional
//! decrement, releases the reservations again if a later step fails, freezes
//! the order, and clears the cart. It also drives the status state machine
//! (admin-gated) and hands finished state changes to the
//! [`NotificationDispatcher`], which emails the customer and degrades to a
//! plain email when receipt rendering fails.

pub mod actor;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod pricing;
pub mod receipt;
pub mod services;
pub mod templates;

pub use actor::{Actor, Role};
pub use coordinator::OrderLifecycle;
pub use dispatcher::{DispatchOutcome, NotificationDispatcher, NotificationKind};
pub use error::FulfillmentError;
pub use pricing::PricingPolicy;
pub use receipt::{MISSING_GAME_PLACEHOLDER, ReceiptDocument, ReceiptLine, build_receipt};
pub use services::{
    Attachment, Customer, CustomerDirectory, Delivery, Email, HtmlReceiptRenderer,
    InMemoryDirectory, InMemoryMailer, MailTransport, NotificationError, ReceiptRenderer,
};
