//! Authentication middleware
//!
//! Extractor for session token verification on protected routes.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::{Address, AuthService};
use crate::error::ApiError;

/// Wallet proven by a valid `Authorization: Bearer <token>` header
#[derive(Debug, Clone)]
pub struct AuthenticatedWallet {
    pub address: Address,
}

/// Extractor for authenticated wallets
///
/// A missing header or a scheme other than `Bearer` is rejected before the
/// token is parsed.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(wallet: AuthenticatedWallet) -> impl IntoResponse {
///     format!("Hello, {}", wallet.address)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedWallet
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized("Authorization header required".to_string())
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let address = auth_service.authenticate(bearer.token()).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            ApiError::from(e)
        })?;

        Ok(AuthenticatedWallet { address })
    }
}
