//! Request guard for protected routes.
//!
//! Clients send the raw token in `x-auth-token` (no `Bearer` scheme), which is
//! what the existing frontend does. On success the caller identity is stored in
//! the request extensions as [`CurrentUser`]; handlers read it from there and
//! never parse the token themselves.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{AuthError, AuthState, TokenService};

pub const TOKEN_HEADER: &str = "x-auth-token";

/// Authenticated caller, available to every handler behind [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
}

/// Resolve the caller from the request headers. Pure: no I/O, no store access.
///
/// # Errors
/// `MissingCredential` when the header is absent or empty, `InvalidCredential`
/// for anything that does not verify.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<CurrentUser, AuthError> {
    let Some(value) = headers.get(TOKEN_HEADER) else {
        return Err(AuthError::MissingCredential);
    };
    let token = value
        .to_str()
        .map_err(|_| AuthError::InvalidCredential)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let claims = tokens.verify(token)?;
    let id = Uuid::parse_str(claims.subject_id()).map_err(|err| {
        debug!("token subject is not a user id: {err}");
        AuthError::InvalidCredential
    })?;

    Ok(CurrentUser { id })
}

/// Middleware: reject unauthenticated requests before they reach the handler.
///
/// # Errors
/// Short-circuits with a 401 response on any credential failure.
pub async fn require_auth(
    Extension(auth): Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(request.headers(), auth.tokens())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or(AuthError::MissingCredential)
    }
}
