//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::Address;
use crate::store::Account;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Query for `GET /api/auth/nonce`
#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    pub address: String,
}

/// A freshly issued challenge
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChallengeResponse {
    pub address: Address,
    pub nonce: String,
    /// The exact text the wallet must sign
    pub message: String,
}

/// Request to verify a signed challenge
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(length(min = 1, max = 64))]
    pub address: String,
    #[validate(length(min = 1, max = 1024))]
    pub message: String,
    /// Hex-encoded `r || s || v`
    #[validate(length(min = 1, max = 256))]
    pub signature: String,
}

/// Session token returned after a successful verification
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyResponse {
    pub token: String,
    pub address: Address,
    pub expires_at: DateTime<Utc>,
}

/// Account view for authenticated callers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserResponse {
    pub address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self {
            address: account.address,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}
