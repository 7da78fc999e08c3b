use axum::{extract::Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{
    error::{ApiError, ErrorResponse},
    normalize_email, users::TokenResponse, valid_email, Validation,
};
use crate::{
    auth::{password, AuthError, AuthState, CurrentUser},
    store::{Store, User},
};

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/auth",
    responses(
        (status = 200, description = "Authenticated user", body = User),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "auth"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn current_user(
    user: CurrentUser,
    store: Extension<Store>,
) -> Result<Json<User>, ApiError> {
    store
        .find_user_by_id(user.id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("User not found"))
}

/// Unknown email and wrong password produce the same response.
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted, token issued", body = TokenResponse),
        (status = 400, description = "Validation failed or invalid credentials", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    store: Extension<Store>,
    auth: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };

    let email = normalize_email(request.email.as_deref().unwrap_or_default());
    let password = request.password.unwrap_or_default();

    Validation::new()
        .check(valid_email(&email), "email", "please include a valid email")
        .check(!password.is_empty(), "password", "Password is required")
        .finish()?;

    let Some(user) = store.find_user_by_email(&email).await? else {
        password::verify_decoy(auth.decoy_hash(), &password).await;
        debug!("login for unknown email");
        return Err(AuthError::InvalidLoginAttempt.into());
    };

    if !password::verify_password(&password, &user.password_hash).await? {
        debug!(user_id = %user.id, "password mismatch");
        return Err(AuthError::InvalidLoginAttempt.into());
    }

    let token = auth.tokens().issue(&user.id.to_string())?;

    Ok(Json(TokenResponse { token }))
}
