//! Route handlers.

pub mod cart;
pub mod games;
pub mod health;
pub mod metrics;
pub mod orders;

use serde::Serialize;

/// Wraps response data in the `{success: true, data}` envelope.
pub(crate) fn envelope<T: Serialize>(data: T) -> serde_json::Value {
    serde_json::json!({ "success": true, "data": data })
}
