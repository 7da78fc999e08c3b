//! The one error body every endpoint returns:
//! `{"errors":[{"msg":"..","param":".."}]}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::auth::{error::MSG_SERVER_ERROR, AuthError};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub msg: String,
    /// Request field that failed validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorMessage>,
}

impl ErrorResponse {
    #[must_use]
    pub fn message(msg: &str) -> Json<Self> {
        Json(Self {
            errors: vec![ErrorMessage {
                msg: msg.to_string(),
                param: None,
            }],
        })
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// Field validation failures (400).
    Validation(Vec<ErrorMessage>),
    /// Request understood but refused (400).
    BadRequest(&'static str),
    /// Caller does not own the resource (401).
    NotAuthorized,
    NotFound(&'static str),
    Auth(AuthError),
    /// Logged, never shown to the client (500).
    Internal(anyhow::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors })).into_response()
            }
            Self::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::message(msg)).into_response()
            }
            Self::NotAuthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::message("User not authorized"),
            )
                .into_response(),
            Self::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorResponse::message(msg)).into_response()
            }
            Self::Auth(err) => err.into_response(),
            Self::Internal(err) => {
                error!("{err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::message(MSG_SERVER_ERROR),
                )
                    .into_response()
            }
        }
    }
}
