//! Authentication service
//!
//! Core business logic for wallet-based authentication: hand out a nonce,
//! then trade a signature over the matching challenge for a session token.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::models::{ChallengeResponse, VerifyResponse};
use crate::store::{Account, AccountStore, StoreError};

use super::address::{Address, AddressError};
use super::challenge::build_message;
use super::crypto::{decode_signature, recover_address, CryptoError};
use super::jwt::{TokenError, TokenIssuer};
use super::nonce::{bounded, NonceManager};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Invalid signature format: {0}")]
    MalformedSignature(String),

    #[error("Could not recover signer from signature")]
    RecoveryFailure,

    #[error("No challenge has been issued for this address")]
    UnknownAddress,

    #[error("Message does not match the current challenge")]
    MessageMismatch,

    #[error("Challenge expired")]
    ChallengeExpired,

    #[error("Signer does not match the claimed address")]
    AddressMismatch,

    #[error("Token expired")]
    Expired,

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Failed to issue token: {0}")]
    TokenIssuance(String),
}

impl From<AddressError> for AuthError {
    fn from(e: AddressError) -> Self {
        AuthError::InvalidAddress(e.0)
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => AuthError::UnknownAddress,
            other => AuthError::StoreFailure(other.to_string()),
        }
    }
}

impl From<CryptoError> for AuthError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::MalformedSignature(reason) => AuthError::MalformedSignature(reason),
            CryptoError::RecoveryFailure => AuthError::RecoveryFailure,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::Expired,
            TokenError::BadSignature => AuthError::BadSignature,
            TokenError::Malformed(reason) => AuthError::MalformedToken(reason),
            TokenError::EncodingFailed(reason) => AuthError::TokenIssuance(reason),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    nonces: NonceManager,
    tokens: TokenIssuer,
    nonce_ttl: chrono::Duration,
    store_timeout: Duration,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(store: Arc<dyn AccountStore>, config: &AuthConfig) -> Self {
        Self {
            nonces: NonceManager::new(store.clone(), config.store_timeout),
            store,
            tokens: TokenIssuer::new(config),
            nonce_ttl: chrono::Duration::seconds(config.nonce_ttl_seconds),
            store_timeout: config.store_timeout,
        }
    }

    /// Issue a fresh nonce for `address`
    #[tracing::instrument(skip(self))]
    pub async fn request_challenge(&self, address: &str) -> Result<ChallengeResponse, AuthError> {
        let address = Address::parse(address)?;

        let nonce = self.nonces.issue_nonce(&address).await?;

        tracing::info!(address = %address, "Challenge issued");

        Ok(ChallengeResponse {
            message: build_message(&nonce),
            address,
            nonce,
        })
    }

    /// Verify a signed challenge and issue a session token
    ///
    /// The nonce is rotated only after every check has passed, so failed
    /// attempts leave the outstanding challenge intact.
    #[tracing::instrument(skip(self, message, signature))]
    pub async fn verify_and_issue(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<VerifyResponse, AuthError> {
        let address = Address::parse(address)?;

        let account: Account = bounded(self.store_timeout, self.store.find(&address))
            .await?
            .ok_or(AuthError::UnknownAddress)?;

        if message != build_message(&account.nonce) {
            return Err(AuthError::MessageMismatch);
        }

        if Utc::now() - account.nonce_issued_at > self.nonce_ttl {
            return Err(AuthError::ChallengeExpired);
        }

        let signature = decode_signature(signature)?;
        let signer = recover_address(message.as_bytes(), &signature)?;

        if signer != address {
            tracing::debug!(claimed = %address, recovered = %signer, "Signer mismatch");
            return Err(AuthError::AddressMismatch);
        }

        // Lost race: another request consumed this nonce between find and here
        if self
            .nonces
            .rotate_nonce_if(&address, &account.nonce)
            .await?
            .is_none()
        {
            return Err(AuthError::MessageMismatch);
        }

        let issued = self.tokens.issue(&address)?;

        tracing::info!(address = %address, expires_at = %issued.expires_at, "Wallet verified");

        Ok(VerifyResponse {
            token: issued.token,
            address,
            expires_at: issued.expires_at,
        })
    }

    /// Validate a bearer token and return its address claim
    pub fn authenticate(&self, token: &str) -> Result<Address, AuthError> {
        Ok(self.tokens.verify(token)?)
    }

    /// Look up the account behind an authenticated address
    pub async fn get_account(&self, address: &Address) -> Result<Account, AuthError> {
        bounded(self.store_timeout, self.store.find(address))
            .await?
            .ok_or(AuthError::UnknownAddress)
    }

    /// Token issuer (for tests and tooling)
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}
