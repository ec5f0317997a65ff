//! Postgres pool for the `accounts` store
//!
//! Connections are bounded by `DB_MAX_CONNECTIONS`; acquiring one waits no
//! longer than a single store call is allowed to take.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

/// Failures while bringing up or probing the account database
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to account database: {0}")]
    Connect(String),

    #[error("Failed to migrate accounts schema: {0}")]
    Migrate(String),

    #[error("Account database unreachable: {0}")]
    Unreachable(String),
}

/// Open the pool backing [`PgAccountStore`](crate::store::PgAccountStore)
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(url = %config.database_url_masked(), "Connecting to account database");

    let acquire_timeout = config.auth.store_timeout.max(Duration::from_secs(1));

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(acquire_timeout)
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .map_err(|e| DbError::Connect(e.to_string()))?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Account database pool ready"
    );

    Ok(pool)
}

/// Create or upgrade the `accounts` table
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::Migrate(e.to_string()))?;

    tracing::info!("Accounts schema up to date");

    Ok(())
}

/// Round-trip a trivial query; used by `/health`
pub async fn check_health(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| DbError::Unreachable(e.to_string()))?;

    Ok(())
}
