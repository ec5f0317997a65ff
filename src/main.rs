//! Wallet sign-in server
//!
//! Serves the nonce and verification endpoints over HTTP with a Postgres
//! account store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

use wallet_auth_server::auth::AuthService;
use wallet_auth_server::config::Config;
use wallet_auth_server::state::AppState;
use wallet_auth_server::store::PgAccountStore;
use wallet_auth_server::{db, middleware, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting wallet sign-in server");

    if config.uses_default_secret() {
        tracing::warn!("Using default JWT secret. Set JWT_SECRET outside development.");
    }

    let db_pool = db::create_pool(&config).await?;
    db::run_migrations(&db_pool).await?;

    let store = Arc::new(PgAccountStore::new(db_pool.clone()));
    let auth_service = Arc::new(AuthService::new(store, &config.auth));
    let app_state = AppState::new(auth_service, Some(db_pool));

    let mut app = routes::create_router(app_state)
        .layer(routes::configure_cors(config.cors_allowed_origins.as_deref()));

    if config.environment.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid HOST/PORT")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
