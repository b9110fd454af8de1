//! Credential issuance and password hashing.
//!
//! Two bearer tokens per login: a short-lived access token and a
//! longer-lived refresh token, both HS256-signed and carrying the
//! subject user id. The refresh token is additionally persisted on the
//! user record as the single active refresh credential.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is expired or invalid")]
    InvalidToken,
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    kind: TokenKind,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl.num_seconds()
    }

    fn issue(&self, user: Uuid, kind: TokenKind, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            kind,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn issue_pair(&self, user: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue(user, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.issue(user, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    /// Verifies signature, expiry and token kind; returns the subject.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        if data.claims.kind != expected {
            return Err(AuthError::InvalidToken);
        }
        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

pub mod password {
    use anyhow::Result;

    #[cfg(not(feature = "test-fast-hasher"))]
    mod hasher {
        use anyhow::{anyhow, Result};
        use argon2::{
            password_hash::{
                rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
            },
            Argon2,
        };

        pub fn hash(plain: &str) -> Result<String> {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(plain.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|err| anyhow!("{}", err))
        }

        pub fn verify(plain: &str, target_hash: &str) -> Result<bool> {
            let parsed = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
            Ok(Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok())
        }
    }

    /// Fast test-only hasher - DO NOT use in production!
    #[cfg(feature = "test-fast-hasher")]
    mod hasher {
        use anyhow::Result;

        pub fn hash(plain: &str) -> Result<String> {
            Ok(format!("$testfast${}", plain))
        }

        pub fn verify(plain: &str, target_hash: &str) -> Result<bool> {
            Ok(target_hash
                .strip_prefix("$testfast$")
                .is_some_and(|stored| stored == plain))
        }
    }

    pub fn hash(plain: &str) -> Result<String> {
        hasher::hash(plain)
    }

    pub fn verify(plain: &str, target_hash: &str) -> Result<bool> {
        hasher::verify(plain, target_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 60, 7)
    }

    #[test]
    fn pair_roundtrip() {
        let issuer = issuer();
        let user = Uuid::new_v4();
        let pair = issuer.issue_pair(user).unwrap();

        assert_eq!(issuer.verify(&pair.access_token, TokenKind::Access).unwrap(), user);
        assert_eq!(
            issuer.verify(&pair.refresh_token, TokenKind::Refresh).unwrap(),
            user
        );
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.issue_pair(Uuid::new_v4()).unwrap();

        assert!(issuer.verify(&pair.refresh_token, TokenKind::Access).is_err());
        assert!(issuer.verify(&pair.access_token, TokenKind::Refresh).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let pair = issuer().issue_pair(Uuid::new_v4()).unwrap();
        let other = TokenIssuer::new("other-secret", 60, 7);
        assert!(other.verify(&pair.access_token, TokenKind::Access).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(issuer().verify("not-a-token", TokenKind::Access).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = password::hash("hunter2").unwrap();
        assert!(password::verify("hunter2", &hash).unwrap());
        assert!(!password::verify("hunter3", &hash).unwrap());
    }
}
