//! API handlers

pub mod auth;
pub mod health;
pub mod user;

pub use auth::*;
pub use health::health_check;
pub use user::get_current_user;

// Re-export AuthenticatedWallet from middleware for handler use
pub use crate::middleware::auth::AuthenticatedWallet;
