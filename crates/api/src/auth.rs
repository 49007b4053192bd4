//! Request identity extraction.
//!
//! Token verification is an upstream concern; by the time a request reaches
//! this service the gateway has resolved it to a user ID and role, passed
//! down as `x-user-id` and `x-user-role` headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domain::UserId;
use fulfillment::{Actor, Role};
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated caller, extracted from request headers.
///
/// A missing or malformed `x-user-id` rejects the request with 401.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        let role = match parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
        {
            Some("admin") => Role::Admin,
            _ => Role::Customer,
        };

        Ok(Identity(Actor { user_id, role }))
    }
}

/// An identity that must carry the admin role, rejected with 403 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity(pub Actor);

impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Identity(actor) = Identity::from_request_parts(parts, state).await?;
        if !actor.is_admin() {
            return Err(ApiError::Forbidden("Admin privileges required".to_string()));
        }
        Ok(AdminIdentity(actor))
    }
}
