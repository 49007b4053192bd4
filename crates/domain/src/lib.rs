//! Domain layer for the GameBazaar order lifecycle.
//!
//! Provides:
//! - [`Aggregate`] and [`DomainEvent`] traits for event-sourced entities
//! - A generic [`CommandHandler`] persisting aggregate events
//! - The [`Cart`](cart::Cart) and [`Order`](order::Order) aggregates with
//!   their services
//! - The catalog: [`Game`](catalog::Game) records behind a
//!   [`CatalogStore`](catalog::CatalogStore) with an atomic conditional
//!   stock decrement

pub mod aggregate;
pub mod cart;
pub mod catalog;
pub mod command;
pub mod error;
pub mod order;
pub mod value_objects;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use cart::{Cart, CartError, CartEvent, CartLineView, CartService, CartView};
pub use catalog::{CatalogError, CatalogStore, Game, InMemoryCatalog};
pub use command::{CommandHandler, CommandResult};
pub use error::DomainError;
pub use order::{
    Order, OrderError, OrderEvent, OrderService, OrderStatus, OrderTotals,
};
pub use value_objects::{
    AdminStamp, CartLine, GameId, Money, OrderLine, PaymentCapture, PaymentMethod,
    ShippingAddress, UserId,
};
