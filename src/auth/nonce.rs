//! Per-address nonce lifecycle
//!
//! Every challenge request and every successful verification replaces the
//! account's nonce, so a nonce can be consumed at most once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::address::Address;
use crate::store::{Account, AccountStore, StoreError};

/// Generate a fresh nonce (UUID v4, 122 random bits)
pub fn generate_nonce() -> String {
    Uuid::new_v4().to_string()
}

/// Run a store call, failing with `StoreError::Timeout` past `limit`
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

/// Issues and rotates nonces through an [`AccountStore`]
#[derive(Clone)]
pub struct NonceManager {
    store: Arc<dyn AccountStore>,
    store_timeout: Duration,
}

impl NonceManager {
    pub fn new(store: Arc<dyn AccountStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Set a fresh nonce for `address`, creating the account on first use
    pub async fn issue_nonce(&self, address: &Address) -> Result<String, StoreError> {
        let existing = bounded(self.store_timeout, self.store.find(address)).await?;

        match existing {
            Some(account) => self.overwrite(account).await,
            None => {
                let nonce = generate_nonce();
                let account = Account::new(address.clone(), nonce.clone(), Utc::now());

                match bounded(self.store_timeout, self.store.create(&account)).await {
                    Ok(()) => {
                        tracing::debug!(address = %address, "Account created");
                        Ok(nonce)
                    }
                    // A concurrent first request won the insert; last writer wins
                    Err(StoreError::Duplicate(_)) => {
                        let account = bounded(self.store_timeout, self.store.find(address))
                            .await?
                            .ok_or_else(|| StoreError::NotFound(address.clone()))?;
                        self.overwrite(account).await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Replace the nonce of an existing account
    pub async fn rotate_nonce(&self, address: &Address) -> Result<String, StoreError> {
        let account = bounded(self.store_timeout, self.store.find(address))
            .await?
            .ok_or_else(|| StoreError::NotFound(address.clone()))?;

        self.overwrite(account).await
    }

    /// Replace the nonce only if it is still `expected`
    ///
    /// Returns the new nonce, or `None` when `expected` was already consumed.
    pub async fn rotate_nonce_if(
        &self,
        address: &Address,
        expected: &str,
    ) -> Result<Option<String>, StoreError> {
        let nonce = generate_nonce();
        let rotated = bounded(
            self.store_timeout,
            self.store
                .rotate_nonce_if(address, expected, &nonce, Utc::now()),
        )
        .await?;

        Ok(rotated.then_some(nonce))
    }

    async fn overwrite(&self, mut account: Account) -> Result<String, StoreError> {
        let now = Utc::now();
        account.nonce = generate_nonce();
        account.nonce_issued_at = now;
        account.updated_at = now;

        bounded(self.store_timeout, self.store.save(&account)).await?;

        Ok(account.nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAccountStore;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Hides an existing account from the first lookup, as when a concurrent
    /// first request inserts between our `find` and `create`
    #[derive(Default)]
    struct RacedStore {
        inner: InMemoryAccountStore,
        looked_up: AtomicBool,
    }

    #[async_trait::async_trait]
    impl AccountStore for RacedStore {
        async fn find(&self, address: &Address) -> Result<Option<Account>, StoreError> {
            if !self.looked_up.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find(address).await
        }

        async fn create(&self, account: &Account) -> Result<(), StoreError> {
            self.inner.create(account).await
        }

        async fn save(&self, account: &Account) -> Result<(), StoreError> {
            self.inner.save(account).await
        }

        async fn rotate_nonce_if(
            &self,
            address: &Address,
            expected: &str,
            new_nonce: &str,
            now: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            self.inner
                .rotate_nonce_if(address, expected, new_nonce, now)
                .await
        }
    }

    fn address() -> Address {
        Address::parse("0x00000000000000000000000000000000000000bb").unwrap()
    }

    fn manager(store: Arc<InMemoryAccountStore>) -> NonceManager {
        NonceManager::new(store, Duration::from_secs(5))
    }

    #[test]
    fn test_generate_nonce_is_unique() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[tokio::test]
    async fn test_issue_nonce_creates_account() {
        let store = Arc::new(InMemoryAccountStore::new());
        let nonce = manager(store.clone()).issue_nonce(&address()).await.unwrap();

        let account = store.find(&address()).await.unwrap().unwrap();
        assert_eq!(account.nonce, nonce);
    }

    #[tokio::test]
    async fn test_issue_nonce_overwrites() {
        let store = Arc::new(InMemoryAccountStore::new());
        let manager = manager(store.clone());

        let first = manager.issue_nonce(&address()).await.unwrap();
        let created_at = store.find(&address()).await.unwrap().unwrap().created_at;
        let second = manager.issue_nonce(&address()).await.unwrap();
        assert_ne!(first, second);

        let account = store.find(&address()).await.unwrap().unwrap();
        assert_eq!(account.nonce, second);
        assert_eq!(account.created_at, created_at);
    }

    #[tokio::test]
    async fn test_issue_nonce_after_lost_insert_race() {
        let store = Arc::new(RacedStore::default());
        store
            .inner
            .create(&Account::new(address(), "rival".to_string(), Utc::now()))
            .await
            .unwrap();

        let manager = NonceManager::new(store.clone(), Duration::from_secs(5));
        let nonce = manager.issue_nonce(&address()).await.unwrap();
        assert_ne!(nonce, "rival");

        let account = store.inner.find(&address()).await.unwrap().unwrap();
        assert_eq!(account.nonce, nonce);
    }

    #[tokio::test]
    async fn test_rotate_nonce_requires_account() {
        let store = Arc::new(InMemoryAccountStore::new());
        let result = manager(store).rotate_nonce(&address()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rotate_nonce() {
        let store = Arc::new(InMemoryAccountStore::new());
        let manager = manager(store.clone());

        let issued = manager.issue_nonce(&address()).await.unwrap();
        let rotated = manager.rotate_nonce(&address()).await.unwrap();
        assert_ne!(issued, rotated);
        assert_eq!(store.find(&address()).await.unwrap().unwrap().nonce, rotated);
    }

    #[tokio::test]
    async fn test_rotate_nonce_if_consumes_once() {
        let store = Arc::new(InMemoryAccountStore::new());
        let manager = manager(store);

        let issued = manager.issue_nonce(&address()).await.unwrap();
        assert!(manager
            .rotate_nonce_if(&address(), &issued)
            .await
            .unwrap()
            .is_some());
        assert!(manager
            .rotate_nonce_if(&address(), &issued)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<(), StoreError> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }
}
