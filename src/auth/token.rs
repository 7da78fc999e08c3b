use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use tracing::debug;

use super::{AuthConfig, AuthError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: String,
}

/// Wire claims: `{ "user": { "id": .. }, "iat": .., "exp": .. }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user: TokenSubject,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.user.id
    }
}

/// Signs and verifies HS256 tokens with the process-wide secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// # Errors
    /// Returns `ServerFault` when the secret is empty.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let secret = config.jwt_secret().expose_secret().as_bytes();
        if secret.is_empty() {
            return Err(AuthError::ServerFault(
                "JWT signing secret must not be empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: config.token_ttl(),
        })
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `subject_id` valid from now until now + ttl.
    ///
    /// # Errors
    /// Returns `ServerFault` if signing fails.
    pub fn issue(&self, subject_id: &str) -> Result<String, AuthError> {
        self.issue_at(subject_id, Utc::now().timestamp())
    }

    /// Mint a token as if it had been issued at `issued_at` (unix seconds).
    ///
    /// # Errors
    /// Returns `ServerFault` if the ttl overflows or signing fails.
    pub fn issue_at(&self, subject_id: &str, issued_at: i64) -> Result<String, AuthError> {
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| AuthError::ServerFault("token ttl out of range".to_string()))?;
        let claims = Claims {
            user: TokenSubject {
                id: subject_id.to_string(),
            },
            iat: issued_at,
            exp: issued_at.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AuthError::ServerFault(format!("failed to sign token: {err}")))
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// Every failure maps to `InvalidCredential`; callers cannot tell an
    /// expired token from a forged one.
    ///
    /// # Errors
    /// Returns `InvalidCredential` on any verification failure.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("token rejected: {err}");
                AuthError::InvalidCredential
            })
    }
}
