//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use wallet_auth_server::auth::crypto::{address_from_verifying_key, hash_personal_message};
use wallet_auth_server::auth::{Address, AuthService};
use wallet_auth_server::config::AuthConfig;
use wallet_auth_server::store::{Account, AccountStore, InMemoryAccountStore, StoreError};

pub const TEST_SECRET: &str = "integration-test-secret";

/// A locally generated wallet
pub struct TestWallet {
    key: SigningKey,
    pub address: Address,
}

impl TestWallet {
    pub fn random() -> Self {
        let key = SigningKey::random(&mut OsRng);
        let address = address_from_verifying_key(key.verifying_key());
        Self { key, address }
    }

    /// Sign like a browser wallet: personal-message hash, `v` in {27, 28}
    pub fn sign(&self, message: &str) -> String {
        let hash = hash_personal_message(message.as_bytes());
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&hash)
            .expect("signing failed");

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }

    /// Address as a user might type it
    pub fn mixed_case_address(&self) -> String {
        let body = &self.address.as_str()[2..];
        let mixed: String = body
            .chars()
            .enumerate()
            .map(|(i, c)| if i % 2 == 0 { c.to_ascii_uppercase() } else { c })
            .collect();
        format!("0x{}", mixed)
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig::with_secret(TEST_SECRET)
}

pub fn service_with(store: Arc<dyn AccountStore>) -> AuthService {
    AuthService::new(store, &auth_config())
}

pub fn memory_service() -> (AuthService, Arc<InMemoryAccountStore>) {
    let store = Arc::new(InMemoryAccountStore::new());
    (service_with(store.clone()), store)
}

/// In-memory store that counts every call
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryAccountStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl AccountStore for CountingStore {
    async fn find(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        self.hit();
        self.inner.find(address).await
    }

    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        self.hit();
        self.inner.create(account).await
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        self.hit();
        self.inner.save(account).await
    }

    async fn rotate_nonce_if(
        &self,
        address: &Address,
        expected: &str,
        new_nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.hit();
        self.inner
            .rotate_nonce_if(address, expected, new_nonce, now)
            .await
    }
}
