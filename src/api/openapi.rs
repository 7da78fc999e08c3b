use super::handlers::{
    auth, error::ErrorMessage, error::ErrorResponse, health, posts, profile, users,
};
use crate::{
    auth::TOKEN_HEADER,
    store::{Comment, Like, Post, Profile, Social, User, UserSummary},
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

/// Name of the security scheme protected routes refer to.
pub const SECURITY_SCHEME: &str = "token";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::register,
        auth::login,
        auth::current_user,
        profile::me,
        profile::upsert,
        profile::list,
        profile::by_user,
        posts::create,
        posts::list,
        posts::get,
        posts::delete,
        posts::like,
        posts::unlike,
        posts::comment,
        posts::delete_comment,
    ),
    components(schemas(
        ErrorMessage,
        ErrorResponse,
        health::Health,
        users::RegisterRequest,
        users::TokenResponse,
        auth::LoginRequest,
        profile::ProfileRequest,
        posts::TextRequest,
        posts::MessageResponse,
        User,
        UserSummary,
        Social,
        Profile,
        Like,
        Comment,
        Post,
    )),
    modifiers(&TokenSecurity),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "Registration"),
        (name = "auth", description = "Login and current user"),
        (name = "profile", description = "Developer profiles"),
        (name = "posts", description = "Posts, likes and comments"),
    )
)]
pub struct ApiDoc;

/// Protected routes expect the raw token in the `x-auth-token` header.
struct TokenSecurity;

impl Modify for TokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                SECURITY_SCHEME,
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(TOKEN_HEADER))),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
