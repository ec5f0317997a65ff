//! Wallet sign-in server library
//!
//! Challenge/response authentication for wallet addresses: a client signs a
//! server-issued nonce and receives a time-bounded bearer token in return.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
