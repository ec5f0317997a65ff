//! Session token generation and validation
//!
//! Session tokens are HS256 JWTs carrying the wallet address and an absolute
//! expiry. They are self-contained: verification never touches the store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::address::Address;
use crate::config::AuthConfig;

/// Token-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    Expired,
}

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Canonical wallet address
    pub address: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and validates session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(config.token_ttl_seconds),
        }
    }

    /// Issue a token for `address`, valid from now
    pub fn issue(&self, address: &Address) -> Result<IssuedToken, TokenError> {
        self.issue_at(address, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        address: &Address,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        // whole seconds, matching what the exp claim can carry
        let exp = (now + self.ttl).timestamp();
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| TokenError::EncodingFailed("Expiry out of range".to_string()))?;

        let claims = Claims {
            address: address.to_string(),
            iat: now.timestamp(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token and return its address claim
    pub fn verify(&self, token: &str) -> Result<Address, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the given clock reading
    ///
    /// No leeway is applied: a token is expired from its `exp` second on.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Address, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked below against the supplied clock
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            },
        )?;

        let claims = token_data.claims;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| TokenError::Malformed("Invalid exp claim".to_string()))?;

        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        Address::parse(&claims.address).map_err(|e| TokenError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn test_address() -> Address {
        Address::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap()
    }

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&AuthConfig::with_secret(secret))
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer("test-secret-key");
        let issued = issuer.issue(&test_address()).unwrap();
        assert!(!issued.token.is_empty());

        let address = issuer.verify(&issued.token).unwrap();
        assert_eq!(address, test_address());
        assert_eq!(address.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_expiry_is_24_hours_by_default() {
        let issuer = issuer("test-secret-key");
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let issued = issuer.issue_at(&test_address(), now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::hours(24));
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer("test-secret-key");
        let issued_at = Utc::now() - Duration::hours(25);

        let issued = issuer.issue_at(&test_address(), issued_at).unwrap();
        assert_eq!(issuer.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_boundary_has_no_leeway() {
        let issuer = issuer("test-secret-key");
        let now = Utc::now();
        let issued = issuer.issue_at(&test_address(), now).unwrap();

        let just_before = issued.expires_at - Duration::seconds(1);
        assert!(issuer.verify_at(&issued.token, just_before).is_ok());
        assert_eq!(
            issuer.verify_at(&issued.token, issued.expires_at),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_flipped_signature_byte() {
        let issuer = issuer("test-secret-key");
        let issued = issuer.issue(&test_address()).unwrap();

        let (payload, signature) = issued.token.rsplit_once('.').unwrap();
        let mut raw = URL_SAFE_NO_PAD.decode(signature).unwrap();
        raw[0] ^= 0x01;
        let tampered = format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(raw));

        assert_eq!(issuer.verify(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_wrong_secret() {
        let issued = issuer("secret1").issue(&test_address()).unwrap();
        assert_eq!(
            issuer("secret2").verify(&issued.token),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_token() {
        let issuer = issuer("test-secret-key");
        assert!(matches!(
            issuer.verify("invalid.token.here"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(issuer.verify(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_invalid_address_claim_is_malformed() {
        let issuer = issuer("test-secret-key");
        let claims = Claims {
            address: "not-an-address".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        assert!(matches!(issuer.verify(&token), Err(TokenError::Malformed(_))));
    }
}
