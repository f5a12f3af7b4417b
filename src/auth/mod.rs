//! Credential verification and bearer tokens.
//!
//! [`Authenticator::authenticate`] is the single place a claimed username and
//! password are checked: the user is looked up, then the password is verified
//! against the stored argon2 hash. On success the resulting [`Principal`]
//! carries the stored hash, never the plaintext.

use std::sync::Arc;

use argon2::password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::{DatabaseError, UserStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username not found")]
    UserNotFound,

    #[error("You provided an incorrect password.")]
    BadCredentials,

    #[error("Stored credential is unusable: {0}")]
    InvalidHash(String),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Authenticated identity attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    /// Stored hash for Basic-authenticated principals, empty for bearer tokens
    pub credential: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(password, &user.password)? {
            return Err(AuthError::BadCredentials);
        }

        Ok(Principal {
            username: user.username,
            credential: user.password,
            roles: user.roles,
        })
    }
}

/// Argon2 PHC hash with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InvalidHash(e.to_string()))
}

fn verify_password(candidate: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::InvalidHash(e.to_string()))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(AuthError::InvalidHash(e.to_string())),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(principal: &Principal, expiry_hours: u64) -> Self {
        let now = Utc::now();
        // Ten years is plenty and keeps the timestamp arithmetic in range.
        let hours = i64::try_from(expiry_hours.min(87_600)).unwrap_or(87_600);
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            sub: principal.username.clone(),
            roles: principal.roles.clone(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Issues and validates HS256 bearer tokens
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    expiry_hours: u64,
}

impl TokenService {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiry_hours: config.jwt_expiry_hours,
        }
    }

    pub fn expires_in_secs(&self) -> u64 {
        self.expiry_hours.saturating_mul(3600)
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let claims = Claims::new(principal, self.expiry_hours);
        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&Header::default(), &claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        Ok(Principal {
            username: token_data.claims.sub,
            credential: String::new(),
            roles: token_data.claims.roles,
        })
    }
}
