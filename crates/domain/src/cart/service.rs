//! Cart service: catalog-validated cart operations.

use common::AggregateId;
use event_store::EventStore;
use serde::Serialize;

use crate::catalog::CatalogStore;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::value_objects::{CartLine, GameId, Money, UserId};

use super::{Cart, CartError};

/// Service for managing a user's cart.
///
/// Validates every mutation against the catalog (existence and stock)
/// before handing it to the aggregate, and resolves game references for
/// display reads. One cart per user; the cart aggregate ID is derived from
/// the user's UUID.
pub struct CartService<S: EventStore, C: CatalogStore> {
    handler: CommandHandler<S, Cart>,
    catalog: C,
}

impl<S: EventStore, C: CatalogStore> CartService<S, C> {
    /// Creates a new cart service.
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            handler: CommandHandler::new(store),
            catalog,
        }
    }

    /// Returns the cart aggregate ID for a user.
    pub fn cart_id_for(user_id: UserId) -> AggregateId {
        AggregateId::from_uuid(user_id.as_uuid())
    }

    /// Adds a game to the user's cart, merging quantities when the game is
    /// already present.
    ///
    /// The unit price is captured now (`discount_price` falling back to
    /// `price`) and stays on the line regardless of later catalog changes.
    /// Stock is validated against the line's total quantity after the add.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        game_id: GameId,
        quantity: u32,
    ) -> Result<CommandResult<Cart>, DomainError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        let game = self
            .catalog
            .get(&game_id)
            .await?
            .ok_or_else(|| CartError::GameNotFound {
                game_id: game_id.to_string(),
            })?;

        let cart_id = Self::cart_id_for(user_id);
        let cart = self.handler.load(cart_id).await?;
        let existing = cart.line(&game_id).map(|l| l.quantity).unwrap_or(0);
        let requested = existing + quantity;

        if !game.has_stock_for(requested) {
            return Err(CartError::OutOfStock {
                title: game.title,
                requested,
                available: game.stock_count,
            }
            .into());
        }

        let unit_price = game.effective_price();
        let line = CartLine::new(game_id, game.title, quantity, unit_price);

        let result = self
            .handler
            .execute_with_snapshot(cart_id, |cart| {
                let mut events = cart.open(cart_id, user_id)?;
                events.extend(cart.add_line(line)?);
                Ok(events)
            })
            .await?;

        metrics::counter!("cart_items_added").increment(quantity as u64);
        Ok(result)
    }

    /// Sets a line's quantity to an absolute value, re-validating stock
    /// against the new quantity (not the delta).
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        game_id: GameId,
        quantity: u32,
    ) -> Result<CommandResult<Cart>, DomainError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        let cart_id = Self::cart_id_for(user_id);
        let cart = self
            .handler
            .load_existing(cart_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        if cart.line(&game_id).is_none() {
            return Err(CartError::LineNotFound {
                game_id: game_id.to_string(),
            }
            .into());
        }

        let game = self
            .catalog
            .get(&game_id)
            .await?
            .ok_or_else(|| CartError::GameNotFound {
                game_id: game_id.to_string(),
            })?;

        if !game.has_stock_for(quantity) {
            return Err(CartError::OutOfStock {
                title: game.title,
                requested: quantity,
                available: game.stock_count,
            }
            .into());
        }

        self.handler
            .execute_with_snapshot(cart_id, |cart| cart.set_line_quantity(game_id, quantity))
            .await
    }

    /// Removes a line from the cart. Removing a line that is not there is a
    /// no-op, but a user without a cart gets `CartNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        game_id: GameId,
    ) -> Result<CommandResult<Cart>, DomainError> {
        let cart_id = Self::cart_id_for(user_id);
        self.handler
            .load_existing(cart_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        self.handler
            .execute_with_snapshot(cart_id, |cart| cart.remove_line(game_id))
            .await
    }

    /// Empties the user's cart. A user without a cart ends up in the same
    /// place, so this never errors on absence.
    #[tracing::instrument(skip(self))]
    pub async fn clear(
        &self,
        user_id: UserId,
        reason: &str,
    ) -> Result<Cart, DomainError> {
        let cart_id = Self::cart_id_for(user_id);
        match self.handler.load_existing(cart_id).await? {
            None => Ok(Cart::default()),
            Some(_) => {
                let result = self
                    .handler
                    .execute_with_snapshot(cart_id, |cart| cart.clear(reason))
                    .await?;
                Ok(result.aggregate)
            }
        }
    }

    /// Loads the raw cart aggregate; a user without a cart reads as an
    /// empty default.
    pub async fn load(&self, user_id: UserId) -> Result<Cart, DomainError> {
        self.handler.load(Self::cart_id_for(user_id)).await
    }

    /// Returns the cart enriched with catalog data for display. Games that
    /// have vanished from the catalog keep their snapshot title and read as
    /// out of stock.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> Result<CartView, DomainError> {
        let cart = self.load(user_id).await?;

        let mut lines = Vec::with_capacity(cart.line_count());
        for line in cart.lines() {
            let game = self.catalog.get(&line.game_id).await?;
            lines.push(match game {
                Some(game) => CartLineView {
                    game_id: line.game_id.clone(),
                    title: line.title.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.total_price(),
                    current_price: Some(game.effective_price()),
                    stock_count: Some(game.stock_count),
                    in_stock: game.in_stock,
                    cover_image: game.cover_image,
                },
                None => CartLineView {
                    game_id: line.game_id.clone(),
                    title: line.title.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.total_price(),
                    cover_image: None,
                    current_price: None,
                    stock_count: None,
                    in_stock: false,
                },
            });
        }
        lines.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(CartView {
            user_id,
            lines,
            total_price: cart.total_price(),
        })
    }
}

/// Display view of a cart with game references resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub user_id: UserId,
    pub lines: Vec<CartLineView>,
    pub total_price: Money,
}

/// A cart line joined with its current catalog record.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub game_id: GameId,
    pub title: String,
    pub quantity: u32,
    /// Price snapshot captured when the line was added.
    pub unit_price: Money,
    pub line_total: Money,
    pub cover_image: Option<String>,
    /// What the game sells for right now, absent when it was deleted.
    pub current_price: Option<Money>,
    pub stock_count: Option<u32>,
    pub in_stock: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Game, InMemoryCatalog};
    use event_store::InMemoryEventStore;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::with_games([
            Game::new(
                "GM-001",
                "Starfall Tactics",
                "Strategy",
                "PC",
                Money::from_cents(2999),
                5,
            ),
            Game::new(
                "GM-002",
                "Void Runner",
                "Action",
                "Switch",
                Money::from_cents(1999),
                2,
            )
            .with_discount(Money::from_cents(1499)),
        ])
    }

    fn service() -> CartService<InMemoryEventStore, InMemoryCatalog> {
        CartService::new(InMemoryEventStore::new(), catalog())
    }

    #[tokio::test]
    async fn add_item_creates_cart_lazily() {
        let service = service();
        let user = UserId::new();

        let result = service
            .add_item(user, GameId::new("GM-001"), 2)
            .await
            .unwrap();

        assert_eq!(result.aggregate.line_count(), 1);
        assert_eq!(result.aggregate.total_price().cents(), 5998);
        assert_eq!(result.aggregate.user_id(), Some(user));
    }

    #[tokio::test]
    async fn add_item_captures_discount_price() {
        let service = service();
        let user = UserId::new();

        let result = service
            .add_item(user, GameId::new("GM-002"), 1)
            .await
            .unwrap();

        let line = result.aggregate.line(&GameId::new("GM-002")).unwrap();
        assert_eq!(line.unit_price.cents(), 1499);
    }

    #[tokio::test]
    async fn add_unknown_game_fails() {
        let service = service();
        let result = service.add_item(UserId::new(), GameId::new("GM-404"), 1).await;
        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::GameNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn add_beyond_stock_fails() {
        let service = service();
        let result = service.add_item(UserId::new(), GameId::new("GM-002"), 3).await;
        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::OutOfStock { .. }))
        ));
    }

    #[tokio::test]
    async fn merged_add_validates_total_quantity() {
        let service = service();
        let user = UserId::new();

        service
            .add_item(user, GameId::new("GM-002"), 2)
            .await
            .unwrap();

        // 2 in the cart + 1 more exceeds the stock of 2
        let result = service.add_item(user, GameId::new("GM-002"), 1).await;
        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::OutOfStock { .. }))
        ));
    }

    #[tokio::test]
    async fn update_item_revalidates_stock_against_new_quantity() {
        let service = service();
        let user = UserId::new();

        service
            .add_item(user, GameId::new("GM-002"), 1)
            .await
            .unwrap();

        let ok = service.update_item(user, GameId::new("GM-002"), 2).await;
        assert!(ok.is_ok());

        let too_many = service.update_item(user, GameId::new("GM-002"), 3).await;
        assert!(matches!(
            too_many,
            Err(DomainError::Cart(CartError::OutOfStock { .. }))
        ));
    }

    #[tokio::test]
    async fn update_without_cart_fails() {
        let service = service();
        let result = service
            .update_item(UserId::new(), GameId::new("GM-001"), 1)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::CartNotFound))
        ));
    }

    #[tokio::test]
    async fn update_zero_quantity_fails() {
        let service = service();
        let user = UserId::new();
        service
            .add_item(user, GameId::new("GM-001"), 1)
            .await
            .unwrap();

        let result = service.update_item(user, GameId::new("GM-001"), 0).await;
        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::InvalidQuantity { .. }))
        ));
    }

    #[tokio::test]
    async fn remove_item_and_absent_line() {
        let service = service();
        let user = UserId::new();
        service
            .add_item(user, GameId::new("GM-001"), 1)
            .await
            .unwrap();

        let result = service
            .remove_item(user, GameId::new("GM-001"))
            .await
            .unwrap();
        assert!(result.aggregate.is_empty());

        // Removing again is a quiet no-op
        let again = service
            .remove_item(user, GameId::new("GM-001"))
            .await
            .unwrap();
        assert!(again.events.is_empty());
    }

    #[tokio::test]
    async fn remove_without_cart_fails() {
        let service = service();
        let result = service
            .remove_item(UserId::new(), GameId::new("GM-001"))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::CartNotFound))
        ));
    }

    #[tokio::test]
    async fn clear_resets_totals() {
        let service = service();
        let user = UserId::new();
        service
            .add_item(user, GameId::new("GM-001"), 2)
            .await
            .unwrap();

        let cart = service.clear(user, "user").await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Money::zero());
    }

    #[tokio::test]
    async fn clear_without_cart_is_noop() {
        let service = service();
        let cart = service.clear(UserId::new(), "user").await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn get_on_absent_cart_returns_empty_view() {
        let service = service();
        let view = service.get(UserId::new()).await.unwrap();
        assert!(view.lines.is_empty());
        assert_eq!(view.total_price, Money::zero());
    }

    #[tokio::test]
    async fn get_resolves_catalog_data() {
        let service = service();
        let user = UserId::new();
        service
            .add_item(user, GameId::new("GM-002"), 1)
            .await
            .unwrap();

        let view = service.get(user).await.unwrap();
        assert_eq!(view.lines.len(), 1);
        let line = &view.lines[0];
        assert_eq!(line.title, "Void Runner");
        assert_eq!(line.current_price, Some(Money::from_cents(1499)));
        assert_eq!(line.stock_count, Some(2));
        assert!(line.in_stock);
    }

    #[tokio::test]
    async fn get_with_deleted_game_keeps_snapshot_title() {
        let catalog = catalog();
        let service = CartService::new(InMemoryEventStore::new(), catalog.clone());
        let user = UserId::new();

        service
            .add_item(user, GameId::new("GM-001"), 1)
            .await
            .unwrap();
        catalog.remove(&GameId::new("GM-001"));

        let view = service.get(user).await.unwrap();
        let line = &view.lines[0];
        assert_eq!(line.title, "Starfall Tactics");
        assert!(line.current_price.is_none());
        assert!(!line.in_stock);
    }
}
