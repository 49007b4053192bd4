//! Order lifecycle coordinator.
//!
//! Drives the multi-step checkout (validate → reserve → place → clear) with
//! compensating releases when a later step fails, and the admin-gated
//! status transitions with their notifications.

use common::AggregateId;
use domain::{
    Aggregate, AdminStamp, CartService, CatalogStore, GameId, Money, Order, OrderLine,
    OrderService, OrderStatus, PaymentCapture, PaymentMethod, ShippingAddress, UserId,
};
use event_store::EventStore;

use crate::actor::Actor;
use crate::dispatcher::{NotificationDispatcher, NotificationKind};
use crate::error::{FulfillmentError, Result};
use crate::pricing::PricingPolicy;
use crate::services::{CustomerDirectory, MailTransport, ReceiptRenderer};

/// Coordinates checkout and order fulfillment.
///
/// Stock is reserved at placement through the catalog's conditional
/// decrement; a reservation that fails part-way releases everything
/// reserved so far, so a rejected checkout leaves stock exactly where it
/// was. Notifications are fire-and-forget: their outcome is logged and
/// never fails an operation whose state change already persisted.
pub struct OrderLifecycle<S, C, M, R, D>
where
    S: EventStore,
    C: CatalogStore,
    M: MailTransport,
    R: ReceiptRenderer,
    D: CustomerDirectory,
{
    cart_service: CartService<S, C>,
    order_service: OrderService<S>,
    catalog: C,
    dispatcher: NotificationDispatcher<C, M, R>,
    directory: D,
    pricing: PricingPolicy,
}

impl<S, C, M, R, D> OrderLifecycle<S, C, M, R, D>
where
    S: EventStore + Clone,
    C: CatalogStore + Clone,
    M: MailTransport,
    R: ReceiptRenderer,
    D: CustomerDirectory,
{
    /// Creates a new lifecycle coordinator.
    pub fn new(
        store: S,
        catalog: C,
        mailer: M,
        renderer: R,
        directory: D,
        pricing: PricingPolicy,
    ) -> Self {
        let cart_service = CartService::new(store.clone(), catalog.clone());
        let order_service = OrderService::new(store);
        let dispatcher = NotificationDispatcher::new(catalog.clone(), mailer, renderer);
        Self {
            cart_service,
            order_service,
            catalog,
            dispatcher,
            directory,
            pricing,
        }
    }

    /// Converts the user's cart into an order.
    ///
    /// Steps: empty-cart guard, per-line stock validation, per-line
    /// reservation (released in reverse on any failure), order placement
    /// with frozen prices and totals, sales counters (best-effort), cart
    /// clear, confirmation email.
    #[tracing::instrument(skip(self, shipping_address))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
        shipping_address: ShippingAddress,
    ) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let cart = self.cart_service.load(user_id).await?;
        if cart.is_empty() {
            return Err(FulfillmentError::EmptyCart);
        }

        // Validation pass: every game must exist and cover its quantity.
        // Prices are frozen from the catalog read here, not the cart's
        // add-time snapshot.
        let mut lines = Vec::with_capacity(cart.line_count());
        for cart_line in cart.lines() {
            let game = self
                .catalog
                .get(&cart_line.game_id)
                .await?
                .ok_or_else(|| FulfillmentError::GameNotFound {
                    game_id: cart_line.game_id.to_string(),
                })?;

            if !game.has_stock_for(cart_line.quantity) {
                return Err(FulfillmentError::InsufficientStock {
                    title: game.title,
                    requested: cart_line.quantity,
                    available: game.stock_count,
                });
            }

            lines.push(OrderLine::new(
                cart_line.game_id.clone(),
                cart_line.quantity,
                game.effective_price(),
            ));
        }

        // Reservation pass: the conditional decrement is the authoritative
        // stock check; the validation above only produces friendlier
        // failures before anything is touched.
        let mut reserved: Vec<(GameId, u32)> = Vec::with_capacity(lines.len());
        for line in &lines {
            if let Err(e) = self.catalog.reserve(&line.game_id, line.quantity).await {
                self.release_reserved(&reserved).await;
                return Err(e.into());
            }
            reserved.push((line.game_id.clone(), line.quantity));
        }

        let subtotal: Money = lines.iter().map(OrderLine::total_price).sum();
        let totals = self.pricing.totals(subtotal);
        let order_id = AggregateId::new();

        let result = match self
            .order_service
            .place_order(
                order_id,
                user_id,
                lines,
                shipping_address,
                payment_method,
                totals,
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.release_reserved(&reserved).await;
                return Err(e.into());
            }
        };

        // Sales counters are best-effort bookkeeping, not part of the
        // order's correctness.
        for (game_id, quantity) in &reserved {
            if let Err(e) = self.catalog.record_sale(game_id, *quantity).await {
                tracing::warn!(%game_id, error = %e, "failed to record sale");
            }
        }

        self.cart_service.clear(user_id, "checkout").await?;

        self.notify(&result.aggregate, NotificationKind::OrderConfirmed)
            .await;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(%order_id, total = %result.aggregate.total_price(), "order placed");

        Ok(result.aggregate)
    }

    /// Moves an order to a new status. Admin only; the aggregate enforces
    /// the transition table. Entering a notifying status emails the
    /// customer.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: AggregateId,
        to: OrderStatus,
        actor: Actor,
    ) -> Result<Order> {
        if !actor.is_admin() {
            return Err(FulfillmentError::Forbidden);
        }

        self.order_service
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        let result = if to == OrderStatus::Cancelled {
            self.order_service
                .cancel_order(order_id, "Cancelled by admin", Some(actor.user_id.to_string()))
                .await?
        } else {
            self.order_service.change_status(order_id, to).await?
        };

        if !result.events.is_empty() && to.notifies() {
            self.notify(&result.aggregate, NotificationKind::StatusChanged(to))
                .await;
        }

        Ok(result.aggregate)
    }

    /// Approves an order, stamping the approving admin's name and email.
    /// Admin only; follows the `Processing → Approved` edge.
    #[tracing::instrument(skip(self))]
    pub async fn approve_order(&self, order_id: AggregateId, actor: Actor) -> Result<Order> {
        if !actor.is_admin() {
            return Err(FulfillmentError::Forbidden);
        }

        self.order_service
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        let stamp = match self.directory.find(actor.user_id).await {
            Some(customer) => AdminStamp {
                name: customer.name,
                email: customer.email,
            },
            None => {
                tracing::debug!(user_id = %actor.user_id, "approving admin has no directory record");
                AdminStamp {
                    name: "Administrator".to_string(),
                    email: String::new(),
                }
            }
        };

        let result = self.order_service.approve_order(order_id, stamp).await?;

        self.notify(
            &result.aggregate,
            NotificationKind::StatusChanged(OrderStatus::Approved),
        )
        .await;

        Ok(result.aggregate)
    }

    /// Records a payment capture. The payer must own the order (or be an
    /// admin); the gateway response itself was validated upstream.
    #[tracing::instrument(skip(self, capture))]
    pub async fn pay_order(
        &self,
        order_id: AggregateId,
        capture: PaymentCapture,
        actor: Actor,
    ) -> Result<Order> {
        let order = self
            .order_service
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        if !actor.is_admin() && order.user_id() != Some(actor.user_id) {
            return Err(FulfillmentError::Forbidden);
        }

        let result = self.order_service.pay_order(order_id, capture).await?;
        Ok(result.aggregate)
    }

    /// Loads an order, enforcing that the caller owns it or is an admin.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: AggregateId, actor: Actor) -> Result<Order> {
        let order = self
            .order_service
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        if !actor.is_admin() && order.user_id() != Some(actor.user_id) {
            return Err(FulfillmentError::Forbidden);
        }

        Ok(order)
    }

    /// Releases reservations in reverse order after a failed step.
    async fn release_reserved(&self, reserved: &[(GameId, u32)]) {
        for (game_id, quantity) in reserved.iter().rev() {
            if let Err(e) = self.catalog.release(game_id, *quantity).await {
                tracing::warn!(%game_id, error = %e, "failed to release reservation");
            }
        }
    }

    /// Resolves the customer and dispatches; outcome is logged, never
    /// propagated.
    async fn notify(&self, order: &Order, kind: NotificationKind) {
        let Some(user_id) = order.user_id() else {
            return;
        };

        match self.directory.find(user_id).await {
            Some(customer) => {
                let outcome = self.dispatcher.dispatch(order, &customer, kind).await;
                if !outcome.delivered {
                    tracing::warn!(
                        order_id = ?order.id(),
                        error = ?outcome.error,
                        "order notification undelivered"
                    );
                }
            }
            None => {
                tracing::warn!(%user_id, "no customer record, skipping notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Customer, HtmlReceiptRenderer, InMemoryDirectory, InMemoryMailer};
    use domain::{Game, InMemoryCatalog};
    use event_store::InMemoryEventStore;

    type Lifecycle = OrderLifecycle<
        InMemoryEventStore,
        InMemoryCatalog,
        InMemoryMailer,
        HtmlReceiptRenderer,
        InMemoryDirectory,
    >;

    struct Harness {
        lifecycle: Lifecycle,
        carts: CartService<InMemoryEventStore, InMemoryCatalog>,
        catalog: InMemoryCatalog,
        mailer: InMemoryMailer,
        directory: InMemoryDirectory,
    }

    fn setup() -> Harness {
        let store = InMemoryEventStore::new();
        let catalog = InMemoryCatalog::with_games([
            Game::new(
                "GM-001",
                "Starfall Tactics",
                "Strategy",
                "PC",
                Money::from_cents(1000),
                10,
            ),
            Game::new(
                "GM-002",
                "Void Runner",
                "Action",
                "Switch",
                Money::from_cents(2500),
                2,
            ),
        ]);
        let mailer = InMemoryMailer::new();
        let directory = InMemoryDirectory::new();

        let lifecycle = OrderLifecycle::new(
            store.clone(),
            catalog.clone(),
            mailer.clone(),
            HtmlReceiptRenderer::new(),
            directory.clone(),
            PricingPolicy::default(),
        );
        let carts = CartService::new(store, catalog.clone());

        Harness {
            lifecycle,
            carts,
            catalog,
            mailer,
            directory,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        }
    }

    async fn known_user(h: &Harness) -> UserId {
        let user = UserId::new();
        h.directory
            .insert(Customer::new(user, "Ada", "ada@example.com"));
        user
    }

    async fn stock(h: &Harness, id: &str) -> u32 {
        h.catalog
            .get(&GameId::new(id))
            .await
            .unwrap()
            .unwrap()
            .stock_count
    }

    #[tokio::test]
    async fn place_order_happy_path() {
        let h = setup();
        let user = known_user(&h).await;

        h.carts.add_item(user, GameId::new("GM-001"), 2).await.unwrap();

        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await
            .unwrap();

        // Order frozen: 2 x $10.00 + 8% tax + $4.99 shipping
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.subtotal().cents(), 2000);
        assert_eq!(order.total_price().cents(), 2659);
        assert!(!order.is_paid());

        // Stock decremented by exactly the ordered quantity
        assert_eq!(stock(&h, "GM-001").await, 8);

        // Cart emptied
        let cart = h.carts.load(user).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Money::zero());

        // Confirmation email with receipt attached
        assert_eq!(h.mailer.sent_count(), 1);
        let email = h.mailer.last_sent().unwrap();
        assert_eq!(email.to, "ada@example.com");
        assert!(email.attachment.is_some());
    }

    #[tokio::test]
    async fn empty_cart_fails_and_creates_nothing() {
        let h = setup();
        let user = known_user(&h).await;

        let result = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await;

        assert!(matches!(result, Err(FulfillmentError::EmptyCart)));
        assert_eq!(h.mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_game() {
        let h = setup();
        let user = known_user(&h).await;

        h.carts.add_item(user, GameId::new("GM-002"), 2).await.unwrap();
        // Another order drains the stock between cart add and checkout
        h.catalog.reserve(&GameId::new("GM-002"), 2).await.unwrap();

        let result = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await;

        match result {
            Err(FulfillmentError::InsufficientStock { title, .. }) => {
                assert_eq!(title, "Void Runner");
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Cart untouched on failure
        let cart = h.carts.load(user).await.unwrap();
        assert_eq!(cart.line_count(), 1);
    }

    /// Catalog wrapper whose `reserve` always fails for one game,
    /// simulating a reservation lost to a concurrent order.
    #[derive(Clone)]
    struct FlakyCatalog {
        inner: InMemoryCatalog,
        fail_reserve_for: GameId,
    }

    #[async_trait::async_trait]
    impl CatalogStore for FlakyCatalog {
        async fn get(&self, id: &GameId) -> std::result::Result<Option<Game>, domain::CatalogError> {
            self.inner.get(id).await
        }
        async fn list(&self) -> std::result::Result<Vec<Game>, domain::CatalogError> {
            self.inner.list().await
        }
        async fn upsert(&self, game: Game) -> std::result::Result<(), domain::CatalogError> {
            self.inner.upsert(game).await
        }
        async fn reserve(
            &self,
            id: &GameId,
            quantity: u32,
        ) -> std::result::Result<(), domain::CatalogError> {
            if *id == self.fail_reserve_for {
                return Err(domain::CatalogError::InsufficientStock {
                    title: "Void Runner".to_string(),
                    requested: quantity,
                    available: 0,
                });
            }
            self.inner.reserve(id, quantity).await
        }
        async fn release(
            &self,
            id: &GameId,
            quantity: u32,
        ) -> std::result::Result<(), domain::CatalogError> {
            self.inner.release(id, quantity).await
        }
        async fn record_sale(
            &self,
            id: &GameId,
            quantity: u32,
        ) -> std::result::Result<(), domain::CatalogError> {
            self.inner.record_sale(id, quantity).await
        }
    }

    #[tokio::test]
    async fn failed_reservation_releases_earlier_lines() {
        let store = InMemoryEventStore::new();
        let inner = InMemoryCatalog::with_games([
            Game::new("GM-001", "Starfall Tactics", "Strategy", "PC", Money::from_cents(1000), 10),
            Game::new("GM-002", "Void Runner", "Action", "Switch", Money::from_cents(2500), 2),
        ]);
        let catalog = FlakyCatalog {
            inner: inner.clone(),
            fail_reserve_for: GameId::new("GM-002"),
        };
        let directory = InMemoryDirectory::new();
        let lifecycle = OrderLifecycle::new(
            store.clone(),
            catalog.clone(),
            InMemoryMailer::new(),
            HtmlReceiptRenderer::new(),
            directory,
            PricingPolicy::default(),
        );
        let carts = CartService::new(store, catalog);

        let user = UserId::new();
        carts.add_item(user, GameId::new("GM-001"), 3).await.unwrap();
        carts.add_item(user, GameId::new("GM-002"), 1).await.unwrap();

        let result = lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InsufficientStock { .. })
        ));

        // Any units reserved before the failing line were released again
        let game = inner.get(&GameId::new("GM-001")).await.unwrap().unwrap();
        assert_eq!(game.stock_count, 10);
    }

    #[tokio::test]
    async fn concurrent_checkouts_for_last_unit() {
        let h = setup();
        // Single unit left
        h.catalog.reserve(&GameId::new("GM-002"), 1).await.unwrap();

        let user_a = known_user(&h).await;
        let user_b = known_user(&h).await;
        h.carts.add_item(user_a, GameId::new("GM-002"), 1).await.unwrap();
        h.carts.add_item(user_b, GameId::new("GM-002"), 1).await.unwrap();

        let (a, b) = tokio::join!(
            h.lifecycle
                .place_order(user_a, PaymentMethod::CreditCard, address()),
            h.lifecycle
                .place_order(user_b, PaymentMethod::Paypal, address()),
        );

        let successes = a.is_ok() as u8 + b.is_ok() as u8;
        assert_eq!(successes, 1, "exactly one of two concurrent orders wins");
        assert_eq!(stock(&h, "GM-002").await, 0);

        for result in [a, b] {
            if let Err(e) = result {
                assert!(matches!(e, FulfillmentError::InsufficientStock { .. }));
            }
        }
    }

    #[tokio::test]
    async fn order_total_survives_price_change() {
        let h = setup();
        let user = known_user(&h).await;
        h.carts.add_item(user, GameId::new("GM-001"), 2).await.unwrap();

        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await
            .unwrap();
        let total_before = order.total_price();

        // Reprice the game afterward
        let mut game = h.catalog.get(&GameId::new("GM-001")).await.unwrap().unwrap();
        game.price = Money::from_cents(9999);
        h.catalog.upsert(game).await.unwrap();

        let reloaded = h
            .lifecycle
            .get_order(order.id().unwrap(), Actor::customer(user))
            .await
            .unwrap();
        assert_eq!(reloaded.total_price(), total_before);
    }

    #[tokio::test]
    async fn non_admin_cannot_change_status() {
        let h = setup();
        let user = known_user(&h).await;
        h.carts.add_item(user, GameId::new("GM-001"), 1).await.unwrap();
        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await
            .unwrap();
        let order_id = order.id().unwrap();

        let result = h
            .lifecycle
            .update_status(order_id, OrderStatus::Processing, Actor::customer(user))
            .await;
        assert!(matches!(result, Err(FulfillmentError::Forbidden)));

        // Status unchanged
        let reloaded = h
            .lifecycle
            .get_order(order_id, Actor::admin(UserId::new()))
            .await
            .unwrap();
        assert_eq!(reloaded.status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn shipped_status_sends_receipt_email() {
        let h = setup();
        let user = known_user(&h).await;
        h.carts.add_item(user, GameId::new("GM-001"), 1).await.unwrap();
        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await
            .unwrap();
        let order_id = order.id().unwrap();
        let admin = Actor::admin(UserId::new());

        h.lifecycle
            .update_status(order_id, OrderStatus::Processing, admin)
            .await
            .unwrap();
        h.lifecycle.approve_order(order_id, admin).await.unwrap();
        let shipped = h
            .lifecycle
            .update_status(order_id, OrderStatus::Shipped, admin)
            .await
            .unwrap();

        assert_eq!(shipped.status(), OrderStatus::Shipped);

        // Confirmation + processing + approved + shipped
        assert_eq!(h.mailer.sent_count(), 4);
        let email = h.mailer.last_sent().unwrap();
        assert!(email.subject.contains("on its way"));
        assert!(email.attachment.is_some());
    }

    #[tokio::test]
    async fn invalid_transition_is_rejected() {
        let h = setup();
        let user = known_user(&h).await;
        h.carts.add_item(user, GameId::new("GM-001"), 1).await.unwrap();
        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await
            .unwrap();
        let admin = Actor::admin(UserId::new());

        let result = h
            .lifecycle
            .update_status(order.id().unwrap(), OrderStatus::Delivered, admin)
            .await;

        assert!(matches!(
            result,
            Err(FulfillmentError::Domain(domain::DomainError::Order(
                domain::OrderError::InvalidTransition { .. }
            )))
        ));
    }

    #[tokio::test]
    async fn approve_stamps_admin_from_directory() {
        let h = setup();
        let user = known_user(&h).await;
        h.carts.add_item(user, GameId::new("GM-001"), 1).await.unwrap();
        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await
            .unwrap();
        let order_id = order.id().unwrap();

        let admin_id = UserId::new();
        h.directory
            .insert(Customer::new(admin_id, "Dana", "dana@gamebazaar.example"));
        let admin = Actor::admin(admin_id);

        h.lifecycle
            .update_status(order_id, OrderStatus::Processing, admin)
            .await
            .unwrap();
        let approved = h.lifecycle.approve_order(order_id, admin).await.unwrap();

        assert_eq!(approved.status(), OrderStatus::Approved);
        let stamp = approved.approved_by().unwrap();
        assert_eq!(stamp.name, "Dana");
        assert_eq!(stamp.email, "dana@gamebazaar.example");
        assert!(approved.approved_at().is_some());
    }

    #[tokio::test]
    async fn pay_order_requires_ownership() {
        let h = setup();
        let user = known_user(&h).await;
        h.carts.add_item(user, GameId::new("GM-001"), 1).await.unwrap();
        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::Paypal, address())
            .await
            .unwrap();
        let order_id = order.id().unwrap();

        let capture = PaymentCapture {
            reference: "txn-9".to_string(),
            status: "COMPLETED".to_string(),
            payer_email: Some("ada@example.com".to_string()),
            captured_at: chrono::Utc::now(),
        };

        let stranger = Actor::customer(UserId::new());
        let result = h
            .lifecycle
            .pay_order(order_id, capture.clone(), stranger)
            .await;
        assert!(matches!(result, Err(FulfillmentError::Forbidden)));

        let paid = h
            .lifecycle
            .pay_order(order_id, capture, Actor::customer(user))
            .await
            .unwrap();
        assert!(paid.is_paid());
        assert!(paid.paid_at().is_some());
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let h = setup();
        let admin = Actor::admin(UserId::new());

        let result = h
            .lifecycle
            .update_status(AggregateId::new(), OrderStatus::Processing, admin)
            .await;
        assert!(matches!(result, Err(FulfillmentError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn transport_failure_never_fails_checkout() {
        let h = setup();
        let user = known_user(&h).await;
        h.carts.add_item(user, GameId::new("GM-001"), 1).await.unwrap();
        h.mailer.set_fail_on_send(true);

        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await
            .unwrap();

        // The order exists and stock moved even though the email died
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(stock(&h, "GM-001").await, 9);
        assert_eq!(h.mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn unknown_customer_skips_notification() {
        let h = setup();
        let user = UserId::new(); // never inserted into the directory
        h.carts.add_item(user, GameId::new("GM-001"), 1).await.unwrap();

        let order = h
            .lifecycle
            .place_order(user, PaymentMethod::CreditCard, address())
            .await
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(h.mailer.sent_count(), 0);
    }
}
