//! Customer directory trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::UserId;

/// The name and email behind a user ID.
///
/// Account management lives upstream; this layer only reads what it needs
/// for emails and approval stamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl Customer {
    /// Creates a new customer record.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Read-only lookup of customer records.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Finds a customer by user ID. A missing record is not an error; the
    /// caller decides whether to skip or degrade.
    async fn find(&self, user_id: UserId) -> Option<Customer>;
}

/// In-memory customer directory used by tests and the default binary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    customers: Arc<RwLock<HashMap<UserId, Customer>>>,
}

impl InMemoryDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory pre-populated with the given customers.
    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let map = customers.into_iter().map(|c| (c.id, c)).collect();
        Self {
            customers: Arc::new(RwLock::new(map)),
        }
    }

    /// Adds or replaces a customer record.
    pub fn insert(&self, customer: Customer) {
        self.customers
            .write()
            .unwrap()
            .insert(customer.id, customer);
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryDirectory {
    async fn find(&self, user_id: UserId) -> Option<Customer> {
        self.customers.read().unwrap().get(&user_id).cloned()
    }
}
