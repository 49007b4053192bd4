//! Catalog store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{CatalogError, Game};
use crate::value_objects::GameId;

/// Trait for catalog access.
///
/// `reserve` is the conditional decrement that closes the oversell race:
/// it checks availability and decrements stock under the same guard, so two
/// concurrent orders for the last unit cannot both succeed. `release` is its
/// compensating inverse, used when a later checkout step fails.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Looks up a game by ID. Deleted games read as `None`, never an error.
    async fn get(&self, game_id: &GameId) -> Result<Option<Game>, CatalogError>;

    /// Lists all games in the catalog.
    async fn list(&self) -> Result<Vec<Game>, CatalogError>;

    /// Inserts or replaces a game record.
    async fn upsert(&self, game: Game) -> Result<(), CatalogError>;

    /// Atomically decrements stock by `quantity`, failing with
    /// [`CatalogError::InsufficientStock`] when fewer units remain.
    async fn reserve(&self, game_id: &GameId, quantity: u32) -> Result<(), CatalogError>;

    /// Returns previously reserved units to stock.
    async fn release(&self, game_id: &GameId, quantity: u32) -> Result<(), CatalogError>;

    /// Bumps the sales counter by `quantity` units.
    async fn record_sale(&self, game_id: &GameId, quantity: u32) -> Result<(), CatalogError>;
}

/// In-memory catalog used by tests and the default server binary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    games: Arc<RwLock<HashMap<GameId, Game>>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-populated with the given games.
    pub fn with_games(games: impl IntoIterator<Item = Game>) -> Self {
        let map = games.into_iter().map(|g| (g.id.clone(), g)).collect();
        Self {
            games: Arc::new(RwLock::new(map)),
        }
    }

    /// Removes a game from the catalog. Orders referencing it keep their
    /// frozen lines and render a placeholder for the title.
    pub fn remove(&self, game_id: &GameId) {
        self.games.write().unwrap().remove(game_id);
    }

    /// Returns the number of games in the catalog.
    pub fn len(&self) -> usize {
        self.games.read().unwrap().len()
    }

    /// Returns true if the catalog holds no games.
    pub fn is_empty(&self) -> bool {
        self.games.read().unwrap().is_empty()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get(&self, game_id: &GameId) -> Result<Option<Game>, CatalogError> {
        Ok(self.games.read().unwrap().get(game_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Game>, CatalogError> {
        let games = self.games.read().unwrap();
        let mut all: Vec<Game> = games.values().cloned().collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(all)
    }

    async fn upsert(&self, game: Game) -> Result<(), CatalogError> {
        self.games.write().unwrap().insert(game.id.clone(), game);
        Ok(())
    }

    async fn reserve(&self, game_id: &GameId, quantity: u32) -> Result<(), CatalogError> {
        // Check and decrement happen under one write lock.
        let mut games = self.games.write().unwrap();
        let game = games.get_mut(game_id).ok_or_else(|| CatalogError::NotFound {
            game_id: game_id.to_string(),
        })?;

        if !game.in_stock || game.stock_count < quantity {
            return Err(CatalogError::InsufficientStock {
                title: game.title.clone(),
                requested: quantity,
                available: game.stock_count,
            });
        }

        game.stock_count -= quantity;
        game.in_stock = game.stock_count > 0;
        Ok(())
    }

    async fn release(&self, game_id: &GameId, quantity: u32) -> Result<(), CatalogError> {
        let mut games = self.games.write().unwrap();
        let game = games.get_mut(game_id).ok_or_else(|| CatalogError::NotFound {
            game_id: game_id.to_string(),
        })?;

        game.stock_count += quantity;
        game.in_stock = true;
        Ok(())
    }

    async fn record_sale(&self, game_id: &GameId, quantity: u32) -> Result<(), CatalogError> {
        let mut games = self.games.write().unwrap();
        let game = games.get_mut(game_id).ok_or_else(|| CatalogError::NotFound {
            game_id: game_id.to_string(),
        })?;

        game.sales_count += quantity as u64;
        Ok(())
    }
}
