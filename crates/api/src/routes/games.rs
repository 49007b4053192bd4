//! Catalog browse endpoints (read-only).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{CatalogStore, Game, GameId};
use event_store::EventStore;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::envelope;
use crate::state::AppState;

#[derive(Serialize)]
pub struct GameResponse {
    pub id: String,
    pub title: String,
    pub genre: String,
    pub platform: String,
    pub price_cents: i64,
    pub discount_price_cents: Option<i64>,
    pub stock_count: u32,
    pub in_stock: bool,
    pub cover_image: Option<String>,
    pub sales_count: u64,
}

impl From<Game> for GameResponse {
    fn from(game: Game) -> Self {
        Self {
            id: game.id.to_string(),
            title: game.title,
            genre: game.genre,
            platform: game.platform,
            price_cents: game.price.cents(),
            discount_price_cents: game.discount_price.map(|p| p.cents()),
            stock_count: game.stock_count,
            in_stock: game.in_stock,
            cover_image: game.cover_image,
            sales_count: game.sales_count,
        }
    }
}

/// GET /games — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let games = state
        .catalog
        .list()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let responses: Vec<GameResponse> = games.into_iter().map(GameResponse::from).collect();
    Ok(Json(envelope(responses)))
}

/// GET /games/{id} — load one game.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let game = state
        .catalog
        .get(&GameId::new(id.as_str()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Game {id} not found")))?;

    Ok(Json(envelope(GameResponse::from(game))))
}
