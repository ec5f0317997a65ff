//! Wallet sign-in
//!
//! Provides wallet-based authentication using Ethereum-style addresses.
//! - Challenge-response authentication with single-use nonces
//! - Signer recovery from personal-message signatures
//! - JWT session token generation and validation

mod address;
pub mod challenge;
pub mod crypto;
mod jwt;
pub mod nonce;
mod service;

pub use address::{Address, AddressError};
pub use challenge::build_message;
pub use crypto::{recover_address, CryptoError};
pub use jwt::{Claims, IssuedToken, TokenError, TokenIssuer};
pub use nonce::NonceManager;
pub use service::{AuthError, AuthService};
