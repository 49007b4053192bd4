//! Caller identity as supplied by the upstream auth collaborator.

use domain::UserId;

/// What a caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// The authenticated caller of an operation.
///
/// Token verification happens upstream; by the time an `Actor` exists the
/// identity is trusted. Admin-only operations check the role here.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    /// Creates a customer actor.
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    /// Creates an admin actor.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Returns true if the actor carries the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
