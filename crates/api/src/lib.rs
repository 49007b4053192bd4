//! HTTP API server for the GameBazaar storefront backend.
//!
//! Exposes the cart, checkout, and order lifecycle over REST with the
//! `{success, data|error}` envelope, plus catalog browsing, a health
//! check, and Prometheus metrics. Identity arrives via `x-user-id` /
//! `x-user-role` headers from the upstream auth gateway.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{CartService, CatalogStore, Game, InMemoryCatalog, Money};
use event_store::EventStore;
use fulfillment::{
    HtmlReceiptRenderer, InMemoryDirectory, InMemoryMailer, OrderLifecycle, PricingPolicy,
};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{
    CustomerOrdersView, OrderBoardView, Projection, ProjectionProcessor, SalesView,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/games", get(routes::games::list::<S>))
        .route("/games/{id}", get(routes::games::get::<S>))
        .route("/cart", post(routes::cart::add::<S>))
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart", delete(routes::cart::clear::<S>))
        .route("/cart/{game_id}", put(routes::cart::update::<S>))
        .route("/cart/{game_id}", delete(routes::cart::remove::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/mine", get(routes::orders::mine::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .route("/orders/{id}/approve", put(routes::orders::approve::<S>))
        .route("/orders/{id}/pay", put(routes::orders::pay::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: in-memory collaborators around
/// the given event store.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
) -> (Arc<AppState<S>>, Arc<ProjectionProcessor<S>>) {
    let catalog = InMemoryCatalog::new();
    let directory = InMemoryDirectory::new();
    let mailer = InMemoryMailer::new();

    let cart_service = CartService::new(event_store.clone(), catalog.clone());
    let lifecycle = OrderLifecycle::new(
        event_store.clone(),
        catalog.clone(),
        mailer.clone(),
        HtmlReceiptRenderer::new(),
        directory.clone(),
        PricingPolicy::default(),
    );

    let customer_orders = Arc::new(CustomerOrdersView::new());
    let order_board = Arc::new(OrderBoardView::new());
    let sales = Arc::new(SalesView::new());

    let mut processor = ProjectionProcessor::new(event_store.clone());
    processor.register(Box::new(customer_orders.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(order_board.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(sales.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    let state = Arc::new(AppState {
        cart_service,
        lifecycle,
        catalog,
        directory,
        mailer,
        customer_orders,
        order_board,
        sales,
        projection_processor: processor.clone(),
        event_store,
    });

    (state, processor)
}

/// Seeds the catalog with a handful of demo titles for local runs.
pub async fn seed_demo_catalog(catalog: &InMemoryCatalog) {
    let games = [
        Game::new(
            "GM-001",
            "Starfall Tactics",
            "Strategy",
            "PC",
            Money::from_cents(2999),
            25,
        ),
        Game::new(
            "GM-002",
            "Void Runner",
            "Action",
            "Switch",
            Money::from_cents(1999),
            40,
        )
        .with_discount(Money::from_cents(1499)),
        Game::new(
            "GM-003",
            "Harvest Lane",
            "Simulation",
            "PC",
            Money::from_cents(2499),
            12,
        ),
        Game::new(
            "GM-004",
            "Neon Drift",
            "Racing",
            "PS5",
            Money::from_cents(5999),
            8,
        )
        .with_discount(Money::from_cents(4999)),
    ];

    for game in games {
        // The in-memory catalog's upsert is infallible
        let _ = catalog.upsert(game).await;
    }
}
