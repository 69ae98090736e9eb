//! Credential primitives: password hashing and signed session tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String>;

    /// Constant-time comparison of `plain` against a stored hash.
    fn compare(&self, plain: &str, hashed: &str) -> Result<bool>;
}

/// [`PasswordHasher`] using bcrypt.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String> {
        Ok(bcrypt::hash(plain, self.cost)?)
    }

    fn compare(&self, plain: &str, hashed: &str) -> Result<bool> {
        Ok(bcrypt::verify(plain, hashed)?)
    }
}

/// Claims carried by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub username: String,
    /// Issued at (Unix seconds).
    pub iat: u64,
    /// Expiration (Unix seconds).
    pub exp: u64,
}

/// Signing and verification of session tokens.
pub trait TokenService: Send + Sync {
    fn create_token(&self, username: &str, secret: &str, expires_in_secs: u64) -> Result<String>;

    /// Verify signature and expiry, returning the claims.
    fn check_token(&self, token: &str, secret: &str) -> Result<TokenPayload>;
}

/// HS256 JWTs via `jsonwebtoken`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtTokenService;

impl TokenService for JwtTokenService {
    fn create_token(&self, username: &str, secret: &str, expires_in_secs: u64) -> Result<String> {
        let now = unix_now();
        let claims = TokenPayload {
            username: username.to_string(),
            iat: now,
            exp: now + expires_in_secs,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(Error::TokenSigning)
    }

    fn check_token(&self, token: &str, secret: &str) -> Result<TokenPayload> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<TokenPayload>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| Error::InvalidToken {
            message: format!("Invalid token: {e}"),
        })
    }
}

/// Secrets and lifetimes for the two token kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_secs: u64,
    pub refresh_secret: String,
    pub refresh_expiration_secs: u64,
}

/// A freshly issued token and its lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResult {
    pub token: String,
    pub expires_in: u64,
}

/// SHA-256 hex digest of a refresh token.
///
/// bcrypt only considers the first 72 bytes of its input, and JWTs sharing a
/// header and username prefix are identical for that long. Hashing the
/// fingerprint instead of the raw token keeps distinct tokens distinct.
pub fn refresh_token_fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcrypt_hash_and_compare() {
        let hasher = BcryptHasher::new(4);
        let hashed = hasher.hash("password").unwrap();
        assert_ne!(hashed, "password");
        assert!(hasher.compare("password", &hashed).unwrap());
        assert!(!hasher.compare("wrong", &hashed).unwrap());
    }

    #[test]
    fn test_token_round_trip() {
        let service = JwtTokenService;
        let token = service.create_token("alice", "secret", 60).unwrap();
        let claims = service.check_token(&token, "secret").unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp, claims.iat + 60);
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let service = JwtTokenService;
        let token = service.create_token("alice", "secret", 60).unwrap();
        let err = service.check_token(&token, "other").unwrap_err();
        assert!(matches!(err, Error::InvalidToken { .. }));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let err = JwtTokenService.check_token("not.a.jwt", "secret").unwrap_err();
        assert!(matches!(err, Error::InvalidToken { .. }));
    }

    #[test]
    fn test_fingerprint_fits_bcrypt_input_and_differs() {
        let a = refresh_token_fingerprint("eyJhbGciOiJIUzI1NiJ9.same-prefix.a");
        let b = refresh_token_fingerprint("eyJhbGciOiJIUzI1NiJ9.same-prefix.b");
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
