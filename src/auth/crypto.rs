//! Wallet signature recovery
//!
//! Recovers the signer address of an EIP-191 personal message from a 65-byte
//! recoverable secp256k1 signature.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

use super::address::Address;

/// Length of an `r || s || v` signature
pub const SIGNATURE_LEN: usize = 65;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Errors that can occur during signature recovery
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid signature format: {0}")]
    MalformedSignature(String),

    #[error("Public key recovery failed")]
    RecoveryFailure,
}

/// Keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Hash a message with the personal-message prefix
///
/// The prefix keeps an authentication signature from being valid as a
/// signature over transaction data.
pub fn hash_personal_message(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize(&mut output);
    output
}

/// Derive the address owning a public key
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // skip the 0x04 uncompressed-point tag
    let hash = keccak256(&point.as_bytes()[1..]);

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(&bytes)
}

/// Decode a hex signature (with or without `0x`) into its 65 raw bytes
pub fn decode_signature(signature_hex: &str) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    let trimmed = signature_hex.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let bytes =
        hex::decode(body).map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;

    bytes.try_into().map_err(|bytes: Vec<u8>| {
        CryptoError::MalformedSignature(format!(
            "Expected {} bytes, got {}",
            SIGNATURE_LEN,
            bytes.len()
        ))
    })
}

/// Recover the address that signed `message`
///
/// # Arguments
/// * `message` - The exact bytes presented to the wallet
/// * `signature` - `r || s || v`, with `v` in `{0, 1}` or `{27, 28}`
pub fn recover_address(message: &[u8], signature: &[u8]) -> Result<Address, CryptoError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::MalformedSignature(format!(
            "Expected {} bytes, got {}",
            SIGNATURE_LEN,
            signature.len()
        )));
    }

    let v = match signature[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        other => {
            return Err(CryptoError::MalformedSignature(format!(
                "Invalid recovery id: {}",
                other
            )))
        }
    };

    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| CryptoError::MalformedSignature(format!("Invalid recovery id: {}", v)))?;

    let signature = Signature::from_slice(&signature[..64])
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;

    // High-S form: negating s mirrors R, so the y parity flips with it
    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (
            low,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    let hash = hash_personal_message(message);

    let key = VerifyingKey::recover_from_prehash(&hash, &signature, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailure)?;

    Ok(address_from_verifying_key(&key))
}
