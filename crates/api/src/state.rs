//! Shared application state wired into every handler.

use std::sync::Arc;

use domain::{CartService, InMemoryCatalog};
use event_store::EventStore;
use fulfillment::{
    HtmlReceiptRenderer, InMemoryDirectory, InMemoryMailer, OrderLifecycle,
};
use projections::{CustomerOrdersView, OrderBoardView, ProjectionProcessor, SalesView};

/// Everything the route handlers need, shared behind an `Arc`.
pub struct AppState<S: EventStore> {
    pub cart_service: CartService<S, InMemoryCatalog>,
    pub lifecycle: OrderLifecycle<
        S,
        InMemoryCatalog,
        InMemoryMailer,
        HtmlReceiptRenderer,
        InMemoryDirectory,
    >,
    pub catalog: InMemoryCatalog,
    pub directory: InMemoryDirectory,
    pub mailer: InMemoryMailer,
    pub customer_orders: Arc<CustomerOrdersView>,
    pub order_board: Arc<OrderBoardView>,
    pub sales: Arc<SalesView>,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
    pub event_store: S,
}
