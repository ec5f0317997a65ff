//! Postgres account store tests

mod common;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use sqlx::PgPool;

    use super::common::{service_with, TestWallet};
    use wallet_auth_server::db::run_migrations;
    use wallet_auth_server::store::{Account, AccountStore, PgAccountStore, StoreError};

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/wallet_auth_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(4)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_create_and_find() {
        let store = PgAccountStore::new(setup_test_db().await);
        let wallet = TestWallet::random();

        assert!(store.find(&wallet.address).await.unwrap().is_none());

        let account = Account::new(wallet.address.clone(), "n1".to_string(), Utc::now());
        store.create(&account).await.unwrap();

        let found = store.find(&wallet.address).await.unwrap().unwrap();
        assert_eq!(found.address, wallet.address);
        assert_eq!(found.nonce, "n1");
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_duplicate_create() {
        let store = PgAccountStore::new(setup_test_db().await);
        let wallet = TestWallet::random();
        let account = Account::new(wallet.address.clone(), "n1".to_string(), Utc::now());

        store.create(&account).await.unwrap();
        let second = store.create(&account).await;

        assert!(matches!(second, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_conditional_rotation() {
        let store = PgAccountStore::new(setup_test_db().await);
        let wallet = TestWallet::random();
        let account = Account::new(wallet.address.clone(), "n1".to_string(), Utc::now());
        store.create(&account).await.unwrap();

        let stale = store
            .rotate_nonce_if(&wallet.address, "other", "n2", Utc::now())
            .await
            .unwrap();
        assert!(!stale);

        let rotated = store
            .rotate_nonce_if(&wallet.address, "n1", "n2", Utc::now())
            .await
            .unwrap();
        assert!(rotated);

        let found = store.find(&wallet.address).await.unwrap().unwrap();
        assert_eq!(found.nonce, "n2");
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_full_flow_against_postgres() {
        let store = Arc::new(PgAccountStore::new(setup_test_db().await));
        let service = service_with(store);
        let wallet = TestWallet::random();

        let challenge = service
            .request_challenge(wallet.address.as_str())
            .await
            .unwrap();
        let signature = wallet.sign(&challenge.message);

        let verified = service
            .verify_and_issue(wallet.address.as_str(), &challenge.message, &signature)
            .await;
        assert!(verified.is_ok());

        let replay = service
            .verify_and_issue(wallet.address.as_str(), &challenge.message, &signature)
            .await;
        assert!(replay.is_err());
    }
}
