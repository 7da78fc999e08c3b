use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::api::handlers::error::ErrorResponse;

pub const MSG_NO_TOKEN: &str = "no token, authorization denied";
pub const MSG_INVALID_TOKEN: &str = "token is not valid";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const MSG_SERVER_ERROR: &str = "Server error";

#[derive(Debug, Error)]
pub enum AuthError {
    /// The `x-auth-token` header was not sent.
    #[error("no token, authorization denied")]
    MissingCredential,
    /// Bad signature, malformed token or expired token.
    #[error("token is not valid")]
    InvalidCredential,
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidLoginAttempt,
    #[error("auth server fault: {0}")]
    ServerFault(String),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential | Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::InvalidLoginAttempt => StatusCode::BAD_REQUEST,
            Self::ServerFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::MissingCredential => MSG_NO_TOKEN,
            Self::InvalidCredential => MSG_INVALID_TOKEN,
            Self::InvalidLoginAttempt => MSG_INVALID_CREDENTIALS,
            Self::ServerFault(_) => MSG_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::ServerFault(detail) = &self {
            error!("auth failure: {detail}");
        }
        (self.status(), ErrorResponse::message(self.public_message())).into_response()
    }
}
