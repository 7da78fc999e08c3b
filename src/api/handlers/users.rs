use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{
    error::{ApiError, ErrorResponse},
    gravatar_url, non_empty, normalize_email, valid_email, Validation,
};
use crate::{
    auth::{
        password::{self, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH},
        AuthState,
    },
    store::{InsertUserOutcome, NewUser, Store},
};

const USER_EXISTS: &str = "User already exists";

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered, token issued", body = TokenResponse),
        (status = 400, description = "Validation failed or user already exists", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn register(
    store: Extension<Store>,
    auth: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };

    let name = non_empty(request.name.as_deref());
    let email = normalize_email(request.email.as_deref().unwrap_or_default());
    let password = request.password.unwrap_or_default();

    Validation::new()
        .check(name.is_some(), "name", "name is required")
        .check(valid_email(&email), "email", "please include a valid email")
        .check(
            password.chars().count() >= MIN_PASSWORD_LENGTH,
            "password",
            "please enter password with 6 or more characters",
        )
        .check(
            password.len() <= MAX_PASSWORD_LENGTH,
            "password",
            "password must be at most 72 bytes",
        )
        .finish()?;

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::BadRequest(USER_EXISTS));
    }

    let password_hash = password::hash_password(&password, auth.bcrypt_cost()).await?;
    drop(password);

    let new_user = NewUser {
        name: name.unwrap_or_default(),
        avatar: gravatar_url(&email),
        email,
        password_hash,
    };

    let user = match store.insert_user(new_user).await? {
        InsertUserOutcome::Created(user) => user,
        InsertUserOutcome::EmailTaken => return Err(ApiError::BadRequest(USER_EXISTS)),
    };

    info!(user_id = %user.id, "user registered");

    let token = auth.tokens().issue(&user.id.to_string())?;

    Ok(Json(TokenResponse { token }))
}
