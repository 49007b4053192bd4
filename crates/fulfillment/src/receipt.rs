//! Receipt document built from an order and its customer.
//!
//! Order lines hold weak game references, so the builder resolves each one
//! against the catalog and substitutes a placeholder row for games that have
//! since been deleted. A missing game never drops a line or fails the build.

use chrono::{DateTime, Utc};
use domain::{Aggregate, CatalogStore, Order};

use crate::services::Customer;

/// Row text rendered for a line whose game no longer exists.
pub const MISSING_GAME_PLACEHOLDER: &str = "Game no longer available";

/// One itemized row of a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    /// Resolved title, or [`MISSING_GAME_PLACEHOLDER`].
    pub title: String,

    /// Platform of the resolved game; absent when unresolved.
    pub platform: Option<String>,

    pub quantity: u32,
    pub unit_price: domain::Money,
    pub line_total: domain::Money,
}

/// Approval block shown when an admin signed off on the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub name: String,
    pub email: String,
    pub approved_at: DateTime<Utc>,
}

/// Everything a renderer needs to produce the receipt.
///
/// The document is renderer-agnostic: the same data feeds the email body,
/// the HTML attachment, and any client-side preview, which is what keeps
/// them in agreement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDocument {
    pub order_id: String,
    pub placed_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    /// Payment method label, uppercased for display.
    pub payment_method_label: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: domain::Money,
    pub tax: domain::Money,
    pub shipping_fee: domain::Money,
    pub total: domain::Money,
    pub is_paid: bool,
    pub approval: Option<Approval>,
}

/// Builds the receipt document for an order.
///
/// Catalog lookups that miss (or error) yield placeholder rows; the receipt
/// always has one row per order line.
pub async fn build_receipt<C: CatalogStore>(
    order: &Order,
    customer: &Customer,
    catalog: &C,
) -> ReceiptDocument {
    let mut lines = Vec::with_capacity(order.lines().len());

    for line in order.lines() {
        let game = catalog.get(&line.game_id).await.ok().flatten();
        lines.push(match game {
            Some(game) => ReceiptLine {
                title: game.title,
                platform: Some(game.platform),
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.total_price(),
            },
            None => ReceiptLine {
                title: MISSING_GAME_PLACEHOLDER.to_string(),
                platform: None,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.total_price(),
            },
        });
    }

    ReceiptDocument {
        order_id: order.id().map(|id| id.to_string()).unwrap_or_default(),
        placed_at: order.placed_at().unwrap_or_else(Utc::now),
        customer_name: customer.name.clone(),
        customer_email: customer.email.clone(),
        payment_method_label: order
            .payment_method()
            .map(|m| m.label().to_uppercase())
            .unwrap_or_default(),
        lines,
        subtotal: order.subtotal(),
        tax: order.tax(),
        shipping_fee: order.shipping_fee(),
        total: order.total_price(),
        is_paid: order.is_paid(),
        approval: order.approved_by().map(|stamp| Approval {
            name: stamp.name.clone(),
            email: stamp.email.clone(),
            approved_at: order.approved_at().unwrap_or_else(Utc::now),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use domain::{
        Aggregate, Game, InMemoryCatalog, Money, OrderLine, OrderTotals, PaymentMethod,
        ShippingAddress, UserId,
    };

    fn customer() -> Customer {
        Customer::new(UserId::new(), "Ada Lovelace", "ada@example.com")
    }

    fn placed_order(lines: Vec<OrderLine>) -> Order {
        let mut order = Order::default();
        let subtotal: Money = lines.iter().map(OrderLine::total_price).sum();
        let events = order
            .place(
                AggregateId::new(),
                UserId::new(),
                lines,
                ShippingAddress {
                    street: "1 Main St".to_string(),
                    city: "Springfield".to_string(),
                    postal_code: "12345".to_string(),
                    country: "US".to_string(),
                },
                PaymentMethod::CreditCard,
                OrderTotals {
                    subtotal,
                    tax: Money::from_cents(160),
                    shipping_fee: Money::from_cents(499),
                    total: subtotal + Money::from_cents(659),
                },
            )
            .unwrap();
        order.apply_events(events);
        order
    }

    #[tokio::test]
    async fn resolves_titles_from_catalog() {
        let catalog = InMemoryCatalog::with_games([Game::new(
            "GM-001",
            "Starfall Tactics",
            "Strategy",
            "PC",
            Money::from_cents(1000),
            5,
        )]);
        let order = placed_order(vec![OrderLine::new("GM-001", 2, Money::from_cents(1000))]);

        let receipt = build_receipt(&order, &customer(), &catalog).await;

        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].title, "Starfall Tactics");
        assert_eq!(receipt.lines[0].platform.as_deref(), Some("PC"));
        assert_eq!(receipt.lines[0].line_total.cents(), 2000);
        assert_eq!(receipt.payment_method_label, "CREDIT CARD");
        assert_eq!(receipt.customer_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn deleted_game_renders_placeholder_row() {
        let catalog = InMemoryCatalog::new();
        let order = placed_order(vec![OrderLine::new("GM-GONE", 1, Money::from_cents(1500))]);

        let receipt = build_receipt(&order, &customer(), &catalog).await;

        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].title, MISSING_GAME_PLACEHOLDER);
        assert!(receipt.lines[0].platform.is_none());
        // The frozen price still shows
        assert_eq!(receipt.lines[0].unit_price.cents(), 1500);
    }

    #[tokio::test]
    async fn approval_block_appears_after_approval() {
        let catalog = InMemoryCatalog::new();
        let mut order = placed_order(vec![OrderLine::new("GM-001", 1, Money::from_cents(1000))]);
        order.apply_events(order.transition_to(domain::OrderStatus::Processing).unwrap());
        order.apply_events(
            order
                .approve(domain::AdminStamp {
                    name: "Dana".to_string(),
                    email: "dana@gamebazaar.example".to_string(),
                })
                .unwrap(),
        );

        let receipt = build_receipt(&order, &customer(), &catalog).await;

        let approval = receipt.approval.unwrap();
        assert_eq!(approval.name, "Dana");
        assert_eq!(approval.email, "dana@gamebazaar.example");
    }
}
