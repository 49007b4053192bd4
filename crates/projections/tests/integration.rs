//! Integration tests: real write-side flows feeding the read models.

use common::AggregateId;
use domain::{
    GameId, Money, OrderLine, OrderService, OrderStatus, OrderTotals, PaymentMethod,
    ShippingAddress, UserId,
};
use event_store::InMemoryEventStore;
use projections::{
    CustomerOrdersView, OrderBoardView, Projection, ProjectionProcessor, SalesView,
};

fn address() -> ShippingAddress {
    ShippingAddress {
        street: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
        country: "US".to_string(),
    }
}

fn totals(subtotal_cents: i64) -> OrderTotals {
    OrderTotals {
        subtotal: Money::from_cents(subtotal_cents),
        tax: Money::zero(),
        shipping_fee: Money::zero(),
        total: Money::from_cents(subtotal_cents),
    }
}

struct World {
    orders: OrderService<InMemoryEventStore>,
    processor: ProjectionProcessor<InMemoryEventStore>,
    customer_orders: CustomerOrdersView,
    board: OrderBoardView,
    sales: SalesView,
}

fn world() -> World {
    let store = InMemoryEventStore::new();
    let orders = OrderService::new(store.clone());

    let customer_orders = CustomerOrdersView::new();
    let board = OrderBoardView::new();
    let sales = SalesView::new();

    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(customer_orders.clone()) as Box<dyn Projection>);
    processor.register(Box::new(board.clone()) as Box<dyn Projection>);
    processor.register(Box::new(sales.clone()) as Box<dyn Projection>);

    World {
        orders,
        processor,
        customer_orders,
        board,
        sales,
    }
}

async fn place(w: &World, user: UserId, lines: Vec<OrderLine>) -> AggregateId {
    let order_id = AggregateId::new();
    let subtotal: Money = lines.iter().map(OrderLine::total_price).sum();
    w.orders
        .place_order(
            order_id,
            user,
            lines,
            address(),
            PaymentMethod::CreditCard,
            totals(subtotal.cents()),
        )
        .await
        .unwrap();
    order_id
}

#[tokio::test]
async fn catch_up_builds_all_views() {
    let w = world();
    let alice = UserId::new();
    let bob = UserId::new();

    place(
        &w,
        alice,
        vec![OrderLine::new("GM-001", 2, Money::from_cents(1000))],
    )
    .await;
    place(
        &w,
        bob,
        vec![OrderLine::new("GM-002", 1, Money::from_cents(2500))],
    )
    .await;

    w.processor.run_catch_up().await.unwrap();

    assert_eq!(w.customer_orders.orders_for(alice).await.len(), 1);
    assert_eq!(w.customer_orders.orders_for(bob).await.len(), 1);
    assert_eq!(w.board.orders(None).await.len(), 2);

    let sales = w.sales.sales_for(&GameId::new("GM-001")).await.unwrap();
    assert_eq!(sales.units_sold, 2);
    assert_eq!(sales.revenue.cents(), 2000);
}

#[tokio::test]
async fn status_walk_is_visible_after_next_catch_up() {
    let w = world();
    let user = UserId::new();
    let order_id = place(
        &w,
        user,
        vec![OrderLine::new("GM-001", 1, Money::from_cents(1000))],
    )
    .await;

    w.processor.run_catch_up().await.unwrap();
    assert_eq!(w.board.count_in_status(OrderStatus::Pending).await, 1);

    w.orders
        .change_status(order_id, OrderStatus::Processing)
        .await
        .unwrap();
    w.processor.run_catch_up().await.unwrap();

    assert_eq!(w.board.count_in_status(OrderStatus::Pending).await, 0);
    assert_eq!(w.board.count_in_status(OrderStatus::Processing).await, 1);

    let mine = w.customer_orders.orders_for(user).await;
    assert_eq!(mine[0].status, OrderStatus::Processing);
}

#[tokio::test]
async fn repeated_catch_up_does_not_double_count() {
    let w = world();
    let user = UserId::new();
    place(
        &w,
        user,
        vec![OrderLine::new("GM-001", 3, Money::from_cents(1000))],
    )
    .await;

    w.processor.run_catch_up().await.unwrap();
    w.processor.run_catch_up().await.unwrap();
    w.processor.run_catch_up().await.unwrap();

    let sales = w.sales.sales_for(&GameId::new("GM-001")).await.unwrap();
    assert_eq!(sales.units_sold, 3);
    assert_eq!(w.customer_orders.orders_for(user).await.len(), 1);
}

#[tokio::test]
async fn rebuild_from_scratch_matches_incremental_state() {
    let w = world();
    let user = UserId::new();
    let order_id = place(
        &w,
        user,
        vec![
            OrderLine::new("GM-001", 1, Money::from_cents(1000)),
            OrderLine::new("GM-002", 2, Money::from_cents(500)),
        ],
    )
    .await;
    w.orders
        .change_status(order_id, OrderStatus::Processing)
        .await
        .unwrap();

    w.processor.run_catch_up().await.unwrap();
    let incremental = w.board.orders(None).await;

    w.processor.rebuild_all().await.unwrap();
    let rebuilt = w.board.orders(None).await;

    assert_eq!(incremental.len(), rebuilt.len());
    assert_eq!(incremental[0].status, rebuilt[0].status);
    assert_eq!(incremental[0].total_price, rebuilt[0].total_price);
}

#[tokio::test]
async fn cancellation_reaches_the_views() {
    let w = world();
    let user = UserId::new();
    let order_id = place(
        &w,
        user,
        vec![OrderLine::new("GM-001", 1, Money::from_cents(1000))],
    )
    .await;
    w.orders
        .cancel_order(order_id, "customer request", None)
        .await
        .unwrap();

    w.processor.run_catch_up().await.unwrap();

    let mine = w.customer_orders.orders_for(user).await;
    assert_eq!(mine[0].status, OrderStatus::Cancelled);
    assert_eq!(w.board.orders(Some(OrderStatus::Cancelled)).await.len(), 1);
}
