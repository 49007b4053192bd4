//! Receipt renderer trait and the default HTML implementation.

use async_trait::async_trait;

use crate::receipt::ReceiptDocument;
use crate::templates;

use super::NotificationError;

/// Renders a receipt document to attachable bytes.
///
/// Rendering may fail (a PDF engine can and does); the dispatcher treats a
/// failure as "send the email without the attachment", so implementations
/// should error rather than panic.
#[async_trait]
pub trait ReceiptRenderer: Send + Sync {
    /// Renders the receipt to bytes.
    async fn render(&self, receipt: &ReceiptDocument) -> Result<Vec<u8>, NotificationError>;

    /// MIME type of the rendered output.
    fn content_type(&self) -> &'static str;

    /// File extension for the attachment name.
    fn file_extension(&self) -> &'static str;
}

/// Renders the receipt as a standalone HTML document.
///
/// Shares the same template as the email body, so the attachment and any
/// on-screen preview of the receipt always agree line for line.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReceiptRenderer;

impl HtmlReceiptRenderer {
    /// Creates a new HTML receipt renderer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReceiptRenderer for HtmlReceiptRenderer {
    async fn render(&self, receipt: &ReceiptDocument) -> Result<Vec<u8>, NotificationError> {
        Ok(templates::receipt_html(receipt).into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "text/html"
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }
}
