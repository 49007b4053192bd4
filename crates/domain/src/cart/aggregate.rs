//! Cart aggregate implementation.

use std::collections::HashMap;

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::value_objects::{CartLine, GameId, Money, UserId};

use super::{
    CartError, CartEvent,
    events::{CartOpenedData, LineAddedData, LineQuantityChangedData},
};

/// Cart aggregate root.
///
/// One cart per user, materialized lazily on the first mutation. Holds at
/// most one line per game; adding a game that is already present merges
/// quantities. The total is maintained incrementally and always equals the
/// sum of line totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    /// Cart identifier, derived from the owning user's UUID.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The user who owns this cart.
    user_id: Option<UserId>,

    /// Lines keyed by game ID.
    lines: HashMap<GameId, CartLine>,

    /// Derived total, recomputed on every mutation.
    total_price: Money,
}

impl Aggregate for Cart {
    type Event = CartEvent;
    type Error = CartError;

    fn aggregate_type() -> &'static str {
        "Cart"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CartEvent::CartOpened(data) => self.apply_opened(data),
            CartEvent::LineAdded(data) => self.apply_line_added(data),
            CartEvent::LineQuantityChanged(data) => self.apply_quantity_changed(data),
            CartEvent::LineRemoved(data) => self.apply_line_removed(data.game_id),
            CartEvent::CartCleared(_) => {
                self.lines.clear();
                self.total_price = Money::zero();
            }
        }
    }
}

impl SnapshotCapable for Cart {
    fn snapshot_interval() -> usize {
        // Carts churn for the lifetime of an account
        50
    }
}

// Query methods
impl Cart {
    /// Returns the owning user's ID.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns all lines in the cart.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Returns the line for a game, if present.
    pub fn line(&self, game_id: &GameId) -> Option<&CartLine> {
        self.lines.get(game_id)
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the derived total.
    pub fn total_price(&self) -> Money {
        self.total_price
    }
}

// Command methods (return events, never mutate)
impl Cart {
    /// Materializes the cart for a user on first mutation.
    pub fn open(&self, cart_id: AggregateId, user_id: UserId) -> Result<Vec<CartEvent>, CartError> {
        if self.id.is_some() {
            // Already open; opening again is a no-op.
            return Ok(vec![]);
        }
        Ok(vec![CartEvent::cart_opened(cart_id, user_id)])
    }

    /// Adds a line, merging quantities when the game is already present.
    pub fn add_line(&self, line: CartLine) -> Result<Vec<CartEvent>, CartError> {
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: line.quantity,
            });
        }

        if let Some(existing) = self.lines.get(&line.game_id) {
            let new_quantity = existing.quantity + line.quantity;
            Ok(vec![CartEvent::line_quantity_changed(
                line.game_id,
                existing.quantity,
                new_quantity,
            )])
        } else {
            Ok(vec![CartEvent::line_added(&line)])
        }
    }

    /// Sets a line's quantity to an absolute value.
    pub fn set_line_quantity(
        &self,
        game_id: GameId,
        quantity: u32,
    ) -> Result<Vec<CartEvent>, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let existing = self
            .lines
            .get(&game_id)
            .ok_or_else(|| CartError::LineNotFound {
                game_id: game_id.to_string(),
            })?;

        if quantity == existing.quantity {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::line_quantity_changed(
            game_id,
            existing.quantity,
            quantity,
        )])
    }

    /// Removes a line. Removing an absent line is a no-op, not an error.
    pub fn remove_line(&self, game_id: GameId) -> Result<Vec<CartEvent>, CartError> {
        if !self.lines.contains_key(&game_id) {
            return Ok(vec![]);
        }
        Ok(vec![CartEvent::line_removed(game_id)])
    }

    /// Empties the cart. A cart with no lines stays as it is.
    pub fn clear(&self, reason: impl Into<String>) -> Result<Vec<CartEvent>, CartError> {
        if self.lines.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![CartEvent::cart_cleared(reason)])
    }
}

// Apply helpers
impl Cart {
    fn apply_opened(&mut self, data: CartOpenedData) {
        self.id = Some(data.cart_id);
        self.user_id = Some(data.user_id);
    }

    fn apply_line_added(&mut self, data: LineAddedData) {
        let line = CartLine::new(
            data.game_id.clone(),
            data.title,
            data.quantity,
            data.unit_price,
        );
        self.total_price += line.total_price();
        self.lines.insert(data.game_id, line);
    }

    fn apply_quantity_changed(&mut self, data: LineQuantityChangedData) {
        if let Some(line) = self.lines.get_mut(&data.game_id) {
            self.total_price -= line.total_price();
            line.quantity = data.new_quantity;
            self.total_price += line.total_price();
        }
    }

    fn apply_line_removed(&mut self, game_id: GameId) {
        if let Some(line) = self.lines.remove(&game_id) {
            self.total_price -= line.total_price();
        }
    }
}
