//! External collaborator traits and their in-memory implementations.

mod directory;
mod mailer;
mod renderer;

pub use directory::{Customer, CustomerDirectory, InMemoryDirectory};
pub use mailer::{Attachment, Delivery, Email, InMemoryMailer, MailTransport};
pub use renderer::{HtmlReceiptRenderer, ReceiptRenderer};

use domain::UserId;
use thiserror::Error;

/// Errors from the notification collaborators.
///
/// These never bubble into a request failure once the triggering state
/// change is persisted; the dispatcher logs them and reports an outcome.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The receipt renderer failed; the email goes out without the
    /// attachment.
    #[error("Receipt rendering failed: {0}")]
    Render(String),

    /// The mail transport refused or dropped the message.
    #[error("Mail transport failed: {0}")]
    Transport(String),

    /// No customer record to address the email to.
    #[error("No customer record for user {0}")]
    UnknownRecipient(UserId),
}
