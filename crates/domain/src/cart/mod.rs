//! Cart aggregate and service.

mod aggregate;
mod events;
mod service;

pub use aggregate::Cart;
pub use events::{
    CartClearedData, CartEvent, CartOpenedData, LineAddedData, LineQuantityChangedData,
    LineRemovedData,
};
pub use service::{CartLineView, CartService, CartView};

use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The user has no cart yet.
    #[error("Cart not found")]
    CartNotFound,

    /// The referenced game does not exist in the catalog.
    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: String },

    /// The game cannot cover the requested quantity.
    #[error("\"{title}\" is out of stock: requested {requested}, available {available}")]
    OutOfStock {
        title: String,
        requested: u32,
        available: u32,
    },

    /// Quantity must be at least 1.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// No line in the cart for the given game.
    #[error("No cart line for game: {game_id}")]
    LineNotFound { game_id: String },
}
