//! Token issuance, password hashing and the request guard.
//!
//! Tokens are stateless HS256 JWTs carrying `{ "user": { "id": .. } }`. They are
//! never stored server side, so a token stays valid until it expires or the
//! signing secret changes.

pub mod error;
pub mod guard;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use guard::{require_auth, CurrentUser, TOKEN_HEADER};
pub use token::{Claims, TokenService};

use secrecy::SecretString;
use std::time::Duration;

/// 100 hours, matching the lifetime the existing client expects.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 360_000;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS),
            bcrypt_cost: password::DEFAULT_COST,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: u64) -> Self {
        self.token_ttl = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}

/// Read-only auth state shared by every request.
#[derive(Debug)]
pub struct AuthState {
    tokens: TokenService,
    bcrypt_cost: u32,
    decoy_hash: String,
}

impl AuthState {
    /// Build the shared state from the startup configuration.
    ///
    /// # Errors
    /// Returns an error if the signing secret is empty or the bcrypt cost is
    /// out of range.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            tokens: TokenService::new(config)?,
            bcrypt_cost: config.bcrypt_cost(),
            decoy_hash: password::decoy_hash(config.bcrypt_cost())?,
        })
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    /// Hash compared against when a login names an unknown email.
    #[must_use]
    pub fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }
}
