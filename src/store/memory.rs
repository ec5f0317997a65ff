use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{Account, AccountStore, StoreError};
use crate::auth::Address;

/// Account store kept in process memory
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<Address, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Address, Account>>, StoreError> {
        self.accounts
            .lock()
            .map_err(|_| StoreError::Database("account map poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        Ok(self.lock()?.get(address).cloned())
    }

    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.lock()?;
        if accounts.contains_key(&account.address) {
            return Err(StoreError::Duplicate(account.address.clone()));
        }
        accounts.insert(account.address.clone(), account.clone());
        Ok(())
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.lock()?;
        let stored = accounts
            .get_mut(&account.address)
            .ok_or_else(|| StoreError::NotFound(account.address.clone()))?;

        stored.nonce = account.nonce.clone();
        stored.nonce_issued_at = account.nonce_issued_at;
        stored.updated_at = account.updated_at;
        Ok(())
    }

    async fn rotate_nonce_if(
        &self,
        address: &Address,
        expected: &str,
        new_nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut accounts = self.lock()?;
        match accounts.get_mut(address) {
            Some(account) if account.nonce == expected => {
                account.nonce = new_nonce.to_string();
                account.nonce_issued_at = now;
                account.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
