//! Game catalog: the store of purchasable titles and their stock.

mod store;

pub use store::{CatalogStore, InMemoryCatalog};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::{GameId, Money};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No game exists with the given ID.
    #[error("Game not found: {game_id}")]
    NotFound { game_id: String },

    /// Not enough stock to satisfy a reservation.
    #[error("Insufficient stock for \"{title}\": requested {requested}, available {available}")]
    InsufficientStock {
        title: String,
        requested: u32,
        available: u32,
    },
}

/// A game in the catalog.
///
/// `in_stock` is maintained alongside `stock_count` rather than derived on
/// read, matching how listings filter on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub title: String,
    pub genre: String,
    pub platform: String,
    pub price: Money,
    /// When present, must be less than or equal to `price`.
    pub discount_price: Option<Money>,
    pub stock_count: u32,
    pub in_stock: bool,
    pub cover_image: Option<String>,
    pub sales_count: u64,
}

impl Game {
    /// Creates a new game with the given stock; `in_stock` follows the count.
    pub fn new(
        id: impl Into<GameId>,
        title: impl Into<String>,
        genre: impl Into<String>,
        platform: impl Into<String>,
        price: Money,
        stock_count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            genre: genre.into(),
            platform: platform.into(),
            price,
            discount_price: None,
            stock_count,
            in_stock: stock_count > 0,
            cover_image: None,
            sales_count: 0,
        }
    }

    /// Sets a discounted price. Clamped to the list price.
    pub fn with_discount(mut self, discount_price: Money) -> Self {
        self.discount_price = Some(discount_price.min(self.price));
        self
    }

    /// Sets the cover image URL.
    pub fn with_cover_image(mut self, url: impl Into<String>) -> Self {
        self.cover_image = Some(url.into());
        self
    }

    /// The price a buyer pays right now: the discount when one is set,
    /// otherwise the list price.
    pub fn effective_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }

    /// Returns true if the game can satisfy an order of `quantity` units.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.in_stock && self.stock_count >= quantity
    }
}
