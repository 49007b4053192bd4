//! Order endpoints: checkout, listing, and lifecycle transitions.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{
    Aggregate, CatalogStore, Order, OrderStatus, PaymentCapture, PaymentMethod, ShippingAddress,
};
use event_store::EventStore;
use fulfillment::MISSING_GAME_PLACEHOLDER;
use serde::{Deserialize, Serialize};

use crate::auth::{AdminIdentity, Identity};
use crate::error::ApiError;
use crate::routes::envelope;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct PayOrderRequest {
    pub reference: String,
    pub status: String,
    pub payer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineResponse>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub placed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub game_id: String,
    /// Resolved title, or the placeholder when the game was deleted.
    pub title: String,
    pub platform: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Builds the full order response, resolving each line's game reference.
async fn order_response<C: CatalogStore>(order: &Order, catalog: &C) -> OrderResponse {
    let mut lines = Vec::with_capacity(order.lines().len());
    for line in order.lines() {
        let game = catalog.get(&line.game_id).await.ok().flatten();
        let (title, platform) = match game {
            Some(game) => (game.title, Some(game.platform)),
            None => (MISSING_GAME_PLACEHOLDER.to_string(), None),
        };
        lines.push(OrderLineResponse {
            game_id: line.game_id.to_string(),
            title,
            platform,
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            line_total_cents: line.total_price().cents(),
        });
    }

    OrderResponse {
        id: order.id().map(|id| id.to_string()).unwrap_or_default(),
        user_id: order.user_id().map(|id| id.to_string()).unwrap_or_default(),
        status: order.status(),
        lines,
        shipping_address: order.shipping_address().cloned(),
        payment_method: order.payment_method(),
        subtotal_cents: order.subtotal().cents(),
        tax_cents: order.tax().cents(),
        shipping_cents: order.shipping_fee().cents(),
        total_cents: order.total_price().cents(),
        is_paid: order.is_paid(),
        paid_at: order.paid_at(),
        approved_by: order.approved_by().map(|s| s.name.clone()),
        placed_at: order.placed_at(),
    }
}

// -- Handlers --

/// POST /orders — convert the caller's cart into an order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let order = state
        .lifecycle
        .place_order(actor.user_id, req.payment_method, req.shipping_address)
        .await?;

    let response = order_response(&order, &state.catalog).await;
    Ok((StatusCode::CREATED, Json(envelope(response))))
}

/// GET /orders/mine — the caller's own orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn mine<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let orders = state.customer_orders.orders_for(actor.user_id).await;
    Ok(Json(envelope(orders)))
}

/// GET /orders — all orders, optionally filtered by status. Admin only.
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AdminIdentity(_actor): AdminIdentity,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            s.parse::<OrderStatus>()
                .map_err(|e| ApiError::BadRequest(e))
        })
        .transpose()?;

    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let orders = state.order_board.orders(status).await;
    Ok(Json(envelope(orders)))
}

/// GET /orders/{id} — load one order; owner or admin.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.get_order(order_id, actor).await?;

    let response = order_response(&order, &state.catalog).await;
    Ok(Json(envelope(response)))
}

/// PUT /orders/{id}/status — move the order along the state machine.
/// Admin only (enforced by the lifecycle).
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = req
        .status
        .parse::<OrderStatus>()
        .map_err(ApiError::BadRequest)?;

    let order = state.lifecycle.update_status(order_id, status, actor).await?;

    let response = order_response(&order, &state.catalog).await;
    Ok(Json(envelope(response)))
}

/// PUT /orders/{id}/approve — approve the order, stamping the admin.
#[tracing::instrument(skip(state))]
pub async fn approve<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.approve_order(order_id, actor).await?;

    let response = order_response(&order, &state.catalog).await;
    Ok(Json(envelope(response)))
}

/// PUT /orders/{id}/pay — record the gateway's payment capture.
#[tracing::instrument(skip(state, req))]
pub async fn pay<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
    Json(req): Json<PayOrderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let capture = PaymentCapture {
        reference: req.reference,
        status: req.status,
        payer_email: req.payer_email,
        captured_at: Utc::now(),
    };

    let order = state.lifecycle.pay_order(order_id, capture, actor).await?;

    let response = order_response(&order, &state.catalog).await;
    Ok(Json(envelope(response)))
}

fn parse_order_id(id: &str) -> Result<AggregateId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(AggregateId::from(uuid))
}
