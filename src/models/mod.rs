//! Data models for the wallet sign-in API

use serde::Serialize;

pub mod auth;
pub use auth::*;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}
