use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::SecurityConfig;
use crate::types::{Role, UserId};

/// Claims carried by portal bearer tokens.
///
/// Identity claims are optional on the wire: tokens minted elsewhere may omit them, and
/// the auth middleware turns an absent claim into a 500 rather than a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<i32>,
    pub exp: i64,
    pub iat: i64,
}

/// A user whose credentials were just verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret is not configured")]
    InvalidSecret,
    #[error("JWT generation error: {0}")]
    Generation(#[source] jsonwebtoken::errors::Error),
    #[error("invalid JWT token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Signs and verifies HS256 bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours as i64),
        })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(&config.jwt_secret, config.jwt_expiry_hours)
    }

    pub fn issue(&self, user: &AuthenticatedUser) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: Some(user.user_id),
            username: Some(user.username.clone()),
            role: Some(user.role.code()),
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Generation)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

/// Hex encoded SHA-256 digest, the format of `users.password_hash`
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare in constant time; stored digests may use upper case hex
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let stored = password_hash.to_ascii_lowercase();
    hash_password(password).as_bytes().ct_eq(stored.as_bytes()).into()
}
