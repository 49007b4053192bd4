//! Fulfillment error types.

use common::AggregateId;
use domain::{CatalogError, DomainError};
use thiserror::Error;

/// Errors that can occur while placing or progressing an order.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Checkout on a cart with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line's game cannot cover the ordered quantity.
    #[error("Insufficient stock for \"{title}\": requested {requested}, available {available}")]
    InsufficientStock {
        title: String,
        requested: u32,
        available: u32,
    },

    /// A cart line references a game that no longer exists.
    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: String },

    /// No order with the given ID.
    #[error("Order not found: {0}")]
    OrderNotFound(AggregateId),

    /// The caller lacks the required privileges.
    #[error("Admin privileges required")]
    Forbidden,

    /// Domain error from the aggregates or their services.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl From<CatalogError> for FulfillmentError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound { game_id } => FulfillmentError::GameNotFound { game_id },
            CatalogError::InsufficientStock {
                title,
                requested,
                available,
            } => FulfillmentError::InsufficientStock {
                title,
                requested,
                available,
            },
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
