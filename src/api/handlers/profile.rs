use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    error::{ApiError, ErrorResponse},
    non_empty, Validation,
};
use crate::{
    auth::CurrentUser,
    store::{Profile, ProfileFields, Social, Store},
};

const PROFILE_NOT_FOUND: &str = "Profile not found";

/// Create/update payload. `skills` is a comma separated list.
#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct ProfileRequest {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub githubusername: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub youtube: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
}

fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

impl ProfileRequest {
    fn into_fields(self, user_id: Uuid) -> Result<ProfileFields, ApiError> {
        let status = non_empty(self.status.as_deref());
        let skills = self
            .skills
            .as_deref()
            .map(split_skills)
            .unwrap_or_default();

        Validation::new()
            .check(status.is_some(), "status", "Status is required")
            .check(!skills.is_empty(), "skills", "Skills is required")
            .finish()?;

        Ok(ProfileFields {
            user_id,
            company: non_empty(self.company.as_deref()),
            website: non_empty(self.website.as_deref()),
            location: non_empty(self.location.as_deref()),
            bio: non_empty(self.bio.as_deref()),
            status: status.unwrap_or_default(),
            githubusername: non_empty(self.githubusername.as_deref()),
            skills,
            social: Social {
                youtube: non_empty(self.youtube.as_deref()),
                twitter: non_empty(self.twitter.as_deref()),
                facebook: non_empty(self.facebook.as_deref()),
                linkedin: non_empty(self.linkedin.as_deref()),
                instagram: non_empty(self.instagram.as_deref()),
            },
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/profile/me",
    responses(
        (status = 200, description = "Caller's profile", body = Profile),
        (status = 400, description = "No profile yet", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "profile"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn me(user: CurrentUser, store: Extension<Store>) -> Result<Json<Profile>, ApiError> {
    store
        .find_profile_by_user(user.id)
        .await?
        .map(Json)
        .ok_or(ApiError::BadRequest("There is no profile for this user"))
}

#[utoipa::path(
    post,
    path = "/api/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile created or updated", body = Profile),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "profile"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn upsert(
    user: CurrentUser,
    store: Extension<Store>,
    payload: Option<Json<ProfileRequest>>,
) -> Result<Json<Profile>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };

    let fields = request.into_fields(user.id)?;

    let profile = store
        .upsert_profile(fields)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    info!(profile_id = %profile.id, "profile saved");

    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "All profiles", body = [Profile]),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "profile"
)]
#[instrument(skip_all)]
pub async fn list(store: Extension<Store>) -> Result<Json<Vec<Profile>>, ApiError> {
    Ok(Json(store.list_profiles().await?))
}

#[utoipa::path(
    get,
    path = "/api/profile/user/{user_id}",
    params(("user_id" = String, Path, description = "Owner's user id")),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 400, description = "Profile not found", body = ErrorResponse)
    ),
    tag = "profile"
)]
#[instrument(skip(store))]
pub async fn by_user(
    Path(user_id): Path<String>,
    store: Extension<Store>,
) -> Result<Json<Profile>, ApiError> {
    let user_id =
        Uuid::parse_str(&user_id).map_err(|_| ApiError::BadRequest(PROFILE_NOT_FOUND))?;

    store
        .find_profile_by_user(user_id)
        .await?
        .map(Json)
        .ok_or(ApiError::BadRequest(PROFILE_NOT_FOUND))
}
