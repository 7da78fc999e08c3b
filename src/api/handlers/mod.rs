//! API handlers and shared request helpers.

pub mod auth;
pub mod error;
pub mod health;
pub mod posts;
pub mod profile;
pub mod root;
pub mod users;

use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use self::error::{ApiError, ErrorMessage};

/// Normalize an email for lookup/uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Gravatar URL for an email (200px, pg rated, mystery-man fallback).
/// Gravatar resolves SHA-256 digests as well as the legacy MD5 ones.
pub fn gravatar_url(email_normalized: &str) -> String {
    let digest = Sha256::digest(email_normalized.as_bytes());
    format!("//www.gravatar.com/avatar/{digest:x}?s=200&r=pg&d=mm")
}

/// Trimmed value, `None` when missing or blank.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parse a path id; malformed ids are reported as "not found".
pub fn parse_id(raw: &str, not_found: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found))
}

/// Collects field errors so all of them are reported at once.
#[derive(Debug, Default)]
pub struct Validation {
    errors: Vec<ErrorMessage>,
}

impl Validation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, param: &str, msg: &str) -> &mut Self {
        if !ok {
            self.errors.push(ErrorMessage {
                msg: msg.to_string(),
                param: Some(param.to_string()),
            });
        }
        self
    }

    /// # Errors
    /// Returns `ApiError::Validation` with every failed check.
    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
