//! Wallet addresses
//!
//! Ethereum-style addresses are 20 bytes rendered as `0x` + 40 hex digits.
//! Input casing is irrelevant; the canonical form is lowercase.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hex digits in an address body
const ADDRESS_HEX_LEN: usize = 40;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid wallet address: {0}")]
pub struct AddressError(pub String);

/// Canonical (lowercase, `0x`-prefixed) wallet address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct Address(String);

impl Address {
    /// Parse an address, accepting an optional `0x`/`0X` prefix and any casing
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if body.len() != ADDRESS_HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError(input.to_string()));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// Build an address from raw 20 bytes
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
