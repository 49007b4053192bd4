//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError, OrderError};
use event_store::EventStoreError;
use fulfillment::FulfillmentError;

/// API-level error type that maps to the `{success: false, error}` envelope.
#[derive(Debug)]
pub enum ApiError {
    /// No usable identity on the request.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Checkout / lifecycle error.
    Fulfillment(FulfillmentError),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "success": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    let message = err.to_string();
    match err {
        FulfillmentError::EmptyCart | FulfillmentError::InsufficientStock { .. } => {
            (StatusCode::BAD_REQUEST, message)
        }
        FulfillmentError::GameNotFound { .. } | FulfillmentError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, message)
        }
        FulfillmentError::Forbidden => (StatusCode::FORBIDDEN, message),
        FulfillmentError::Domain(inner) => domain_error_to_response(inner),
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::CartNotFound
            | CartError::GameNotFound { .. }
            | CartError::LineNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            CartError::OutOfStock { .. } | CartError::InvalidQuantity { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
            OrderError::NotPlaced => (StatusCode::NOT_FOUND, err.to_string()),
            OrderError::AlreadyPlaced | OrderError::NoLines | OrderError::AlreadyPaid => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        },
        DomainError::Catalog(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::AggregateNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "unexpected domain error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
