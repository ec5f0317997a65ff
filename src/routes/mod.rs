//! Route definitions for the wallet sign-in API

mod auth;
mod user;

use axum::{http::HeaderValue, http::Method, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::health_check;
use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;
pub use user::user_routes;

/// Build the application router with tracing and security headers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(user_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_tracing))
                .layer(axum::middleware::from_fn(middleware::security_headers)),
        )
}

/// CORS layer from a comma-separated origin list; permissive when unset
pub fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.trim().is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
