//! Mail transport trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::NotificationError;

/// A rendered email ready for delivery.
#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub attachment: Option<Attachment>,
}

/// A binary attachment (the rendered receipt).
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Transport acknowledgement for a delivered email.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Message ID assigned by the transport.
    pub message_id: String,
}

/// Trait for outbound email delivery.
///
/// Failures are reported, never retried; the order lifecycle proceeds
/// regardless of what happens here.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Sends an email, returning the transport's message ID.
    async fn send(&self, email: Email) -> Result<Delivery, NotificationError>;
}

#[derive(Debug, Default)]
struct InMemoryMailerState {
    sent: Vec<Email>,
    next_id: u32,
    fail_on_send: bool,
}

/// In-memory mail transport used by tests and the default binary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailer {
    state: Arc<RwLock<InMemoryMailerState>>,
}

impl InMemoryMailer {
    /// Creates a new in-memory mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the mailer to fail on subsequent send calls.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of emails sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns the most recently sent email.
    pub fn last_sent(&self) -> Option<Email> {
        self.state.read().unwrap().sent.last().cloned()
    }

    /// Returns every sent email.
    pub fn sent(&self) -> Vec<Email> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl MailTransport for InMemoryMailer {
    async fn send(&self, email: Email) -> Result<Delivery, NotificationError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(NotificationError::Transport(
                "SMTP connection refused".to_string(),
            ));
        }

        state.next_id += 1;
        let message_id = format!("MSG-{:04}", state.next_id);
        state.sent.push(email);

        Ok(Delivery { message_id })
    }
}
