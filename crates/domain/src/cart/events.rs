//! Cart domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{CartLine, GameId, Money, UserId};

/// Events that can occur on a cart aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    /// The cart was materialized on the user's first mutation.
    CartOpened(CartOpenedData),

    /// A new line was added.
    LineAdded(LineAddedData),

    /// An existing line's quantity changed (including merge-on-add).
    LineQuantityChanged(LineQuantityChangedData),

    /// A line was removed.
    LineRemoved(LineRemovedData),

    /// All lines were removed at once.
    CartCleared(CartClearedData),
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::CartOpened(_) => "CartOpened",
            CartEvent::LineAdded(_) => "LineAdded",
            CartEvent::LineQuantityChanged(_) => "LineQuantityChanged",
            CartEvent::LineRemoved(_) => "LineRemoved",
            CartEvent::CartCleared(_) => "CartCleared",
        }
    }
}

/// Data for CartOpened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartOpenedData {
    /// The cart aggregate ID (derived from the owning user).
    pub cart_id: AggregateId,

    /// The user who owns the cart.
    pub user_id: UserId,

    /// When the cart was first materialized.
    pub opened_at: DateTime<Utc>,
}

/// Data for LineAdded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineAddedData {
    /// The game that was added.
    pub game_id: GameId,

    /// Title snapshot for display.
    pub title: String,

    /// Quantity added.
    pub quantity: u32,

    /// Unit price captured at add time.
    pub unit_price: Money,
}

/// Data for LineQuantityChanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineQuantityChangedData {
    /// The game whose line changed.
    pub game_id: GameId,

    /// Previous quantity.
    pub old_quantity: u32,

    /// New quantity.
    pub new_quantity: u32,
}

/// Data for LineRemoved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRemovedData {
    /// The game whose line was removed.
    pub game_id: GameId,
}

/// Data for CartCleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartClearedData {
    /// When the cart was cleared.
    pub cleared_at: DateTime<Utc>,

    /// What triggered the clear ("checkout" or "user").
    pub reason: String,
}

// Convenience constructors
impl CartEvent {
    /// Creates a CartOpened event.
    pub fn cart_opened(cart_id: AggregateId, user_id: UserId) -> Self {
        CartEvent::CartOpened(CartOpenedData {
            cart_id,
            user_id,
            opened_at: Utc::now(),
        })
    }

    /// Creates a LineAdded event from a cart line.
    pub fn line_added(line: &CartLine) -> Self {
        CartEvent::LineAdded(LineAddedData {
            game_id: line.game_id.clone(),
            title: line.title.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
    }

    /// Creates a LineQuantityChanged event.
    pub fn line_quantity_changed(game_id: GameId, old_quantity: u32, new_quantity: u32) -> Self {
        CartEvent::LineQuantityChanged(LineQuantityChangedData {
            game_id,
            old_quantity,
            new_quantity,
        })
    }

    /// Creates a LineRemoved event.
    pub fn line_removed(game_id: GameId) -> Self {
        CartEvent::LineRemoved(LineRemovedData { game_id })
    }

    /// Creates a CartCleared event.
    pub fn cart_cleared(reason: impl Into<String>) -> Self {
        CartEvent::CartCleared(CartClearedData {
            cleared_at: Utc::now(),
            reason: reason.into(),
        })
    }
}
