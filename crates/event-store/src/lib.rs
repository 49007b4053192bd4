//! Event-sourced persistence for carts and orders.
//!
//! Every state change in the system is an [`EventEnvelope`] appended to a
//! stream identified by its aggregate ID. Appends carry an expected version
//! so concurrent writers to the same stream are serialized by the store
//! rather than by luck ([`AppendOptions`]).
//!
//! Two implementations are provided: [`InMemoryEventStore`] for tests and
//! local runs, and [`PostgresEventStore`] backed by sqlx.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod snapshot;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::EventQuery;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
