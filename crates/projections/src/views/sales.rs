//! Sales read model — units sold and revenue per game.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{GameId, Money, OrderEvent};
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Sales totals for one game.
#[derive(Debug, Clone, Serialize)]
pub struct GameSales {
    pub game_id: GameId,
    pub units_sold: u64,
    pub revenue: Money,
}

struct SalesState {
    games: HashMap<GameId, GameSales>,
    position: ProjectionPosition,
}

/// Aggregated sales per game, folded from `OrderPlaced` events.
///
/// Cancellations are not subtracted; the view counts what was ordered,
/// like the storefront's sales counter.
#[derive(Clone)]
pub struct SalesView {
    state: Arc<RwLock<SalesState>>,
}

impl SalesView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SalesState {
                games: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Returns the sales totals for one game.
    pub async fn sales_for(&self, game_id: &GameId) -> Option<GameSales> {
        self.state.read().await.games.get(game_id).cloned()
    }

    /// Returns the best-selling games, limited to `limit` results.
    pub async fn top_sellers(&self, limit: usize) -> Vec<GameSales> {
        let state = self.state.read().await;
        let mut games: Vec<GameSales> = state.games.values().cloned().collect();
        games.sort_by(|a, b| b.units_sold.cmp(&a.units_sold));
        games.truncate(limit);
        games
    }
}

impl Default for SalesView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for SalesView {
    fn name(&self) -> &'static str {
        "SalesView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let mut state = self.state.write().await;

        if event.aggregate_type != "Order" {
            state.position = state.position.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;

        if let OrderEvent::OrderPlaced(data) = order_event {
            for line in &data.lines {
                let entry = state
                    .games
                    .entry(line.game_id.clone())
                    .or_insert_with(|| GameSales {
                        game_id: line.game_id.clone(),
                        units_sold: 0,
                        revenue: Money::zero(),
                    });
                entry.units_sold += line.quantity as u64;
                entry.revenue += line.total_price();
            }
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.games.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for SalesView {
    fn name(&self) -> &'static str {
        "SalesView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.games.len()).unwrap_or(0)
    }
}
