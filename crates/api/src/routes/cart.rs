//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::GameId;
use event_store::EventStore;
use serde::Deserialize;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::routes::envelope;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub game_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// POST /cart — add a game to the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    state
        .cart_service
        .add_item(actor.user_id, GameId::new(req.game_id), req.quantity)
        .await?;

    let view = state.cart_service.get(actor.user_id).await?;
    Ok((StatusCode::CREATED, Json(envelope(view))))
}

/// PUT /cart/{game_id} — set a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(game_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .cart_service
        .update_item(actor.user_id, GameId::new(game_id), req.quantity)
        .await?;

    let view = state.cart_service.get(actor.user_id).await?;
    Ok(Json(envelope(view)))
}

/// DELETE /cart/{game_id} — remove a line.
#[tracing::instrument(skip(state))]
pub async fn remove<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(game_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .cart_service
        .remove_item(actor.user_id, GameId::new(game_id))
        .await?;

    let view = state.cart_service.get(actor.user_id).await?;
    Ok(Json(envelope(view)))
}

/// DELETE /cart — clear the cart.
#[tracing::instrument(skip(state))]
pub async fn clear<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.cart_service.clear(actor.user_id, "user").await?;

    let view = state.cart_service.get(actor.user_id).await?;
    Ok(Json(envelope(view)))
}

/// GET /cart — the caller's cart with game references resolved.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<serde_json::Value>, ApiError> {
    let view = state.cart_service.get(actor.user_id).await?;
    Ok(Json(envelope(view)))
}
