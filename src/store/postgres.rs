use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{Account, AccountStore, StoreError};
use crate::auth::Address;

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Account store backed by the `accounts` table
#[derive(Clone)]
pub struct PgAccountStore {
    db_pool: PgPool,
}

impl PgAccountStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait::async_trait]
impl AccountStore for PgAccountStore {
    async fn find(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as(
            r#"
            SELECT address, nonce, nonce_issued_at, created_at, updated_at
            FROM accounts
            WHERE address = $1
            "#,
        )
        .bind(address)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(account)
    }

    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (address, nonce, nonce_issued_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&account.address)
        .bind(&account.nonce)
        .bind(account.nonce_issued_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Duplicate(account.address.clone())
            }
            _ => StoreError::from(e),
        })?;

        Ok(())
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET nonce = $1, nonce_issued_at = $2, updated_at = $3
            WHERE address = $4
            "#,
        )
        .bind(&account.nonce)
        .bind(account.nonce_issued_at)
        .bind(account.updated_at)
        .bind(&account.address)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound(account.address.clone()));
        }

        Ok(())
    }

    async fn rotate_nonce_if(
        &self,
        address: &Address,
        expected: &str,
        new_nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // Single statement so two verifications cannot both consume `expected`
        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET nonce = $1, nonce_issued_at = $2, updated_at = $2
            WHERE address = $3 AND nonce = $4
            "#,
        )
        .bind(new_nonce)
        .bind(now)
        .bind(address)
        .bind(expected)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        Ok(rows_affected == 1)
    }
}
