//! Read models for the GameBazaar query side.
//!
//! Events appended by the write side are replayed into denormalized views:
//! - [`CustomerOrdersView`] for a customer's own orders (`GET /orders/mine`)
//! - [`OrderBoardView`] for every order with a status filter for admins
//! - [`SalesView`] for units sold and revenue per game
//!
//! The [`ProjectionProcessor`] feeds events from the store to each
//! registered [`Projection`].

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{CustomerOrdersView, GameSales, OrderBoardView, OrderSummary, SalesView};
