//! Account persistence
//!
//! The authentication engine only needs a key-value view of accounts keyed
//! by address. [`PgAccountStore`] backs production, [`InMemoryAccountStore`]
//! backs tests and single-process deployments.

mod memory;
mod postgres;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Address;

pub use memory::InMemoryAccountStore;
pub use postgres::PgAccountStore;

/// A wallet that has requested at least one challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub address: Address,
    pub nonce: String,
    pub nonce_issued_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(address: Address, nonce: String, now: DateTime<Utc>) -> Self {
        Self {
            address,
            nonce,
            nonce_issued_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Account already exists: {0}")]
    Duplicate(Address),

    #[error("Account not found: {0}")]
    NotFound(Address),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    async fn find(&self, address: &Address) -> Result<Option<Account>, StoreError>;

    /// Insert a new account; `Duplicate` if the address is taken
    async fn create(&self, account: &Account) -> Result<(), StoreError>;

    /// Overwrite the nonce fields of an existing account
    async fn save(&self, account: &Account) -> Result<(), StoreError>;

    /// Replace the nonce only if it still equals `expected`
    ///
    /// Returns `false` when the stored nonce has already moved on.
    async fn rotate_nonce_if(
        &self,
        address: &Address,
        expected: &str,
        new_nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
