use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    error::{ApiError, ErrorResponse},
    non_empty, parse_id, Validation,
};
use crate::{
    auth::CurrentUser,
    store::{Authored, Comment, Like, Post, Store, User},
};

const POST_NOT_FOUND: &str = "Post not found";
const COMMENT_NOT_FOUND: &str = "Comment does not exist";
const USER_NOT_FOUND: &str = "User not found";

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct TextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub msg: String,
}

async fn load_post(store: &Store, id: Uuid) -> Result<Post, ApiError> {
    store
        .find_post(id)
        .await?
        .ok_or(ApiError::NotFound(POST_NOT_FOUND))
}

async fn load_user(store: &Store, user: CurrentUser) -> Result<User, ApiError> {
    store
        .find_user_by_id(user.id)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))
}

/// Validate `text` and stamp it with the caller's name and avatar.
async fn authored(
    store: &Store,
    user: CurrentUser,
    payload: Option<Json<TextRequest>>,
) -> Result<Authored, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };

    let text = non_empty(request.text.as_deref());
    Validation::new()
        .check(text.is_some(), "text", "Text is required")
        .finish()?;

    let author = load_user(store, user).await?;

    Ok(Authored {
        user_id: author.id,
        text: text.unwrap_or_default(),
        name: author.name,
        avatar: author.avatar,
    })
}

#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Post created", body = Post),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "posts"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    user: CurrentUser,
    store: Extension<Store>,
    payload: Option<Json<TextRequest>>,
) -> Result<Json<Post>, ApiError> {
    let new_post = authored(&store, user, payload).await?;
    let post = store.insert_post(new_post).await?;

    info!(post_id = %post.id, "post created");

    Ok(Json(post))
}

#[utoipa::path(
    get,
    path = "/api/posts",
    responses(
        (status = 200, description = "All posts, newest first", body = [Post]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "posts"
)]
#[instrument(skip_all)]
pub async fn list(_user: CurrentUser, store: Extension<Store>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(store.list_posts().await?))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "posts"
)]
#[instrument(skip(_user, store))]
pub async fn get(
    _user: CurrentUser,
    Path(id): Path<String>,
    store: Extension<Store>,
) -> Result<Json<Post>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(load_post(&store, id).await?))
}

/// Only the author may delete; a missing post is reported before ownership.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post removed", body = MessageResponse),
        (status = 401, description = "Not the author, or missing token", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "posts"
)]
#[instrument(skip(user, store), fields(user_id = %user.id))]
pub async fn delete(
    user: CurrentUser,
    Path(id): Path<String>,
    store: Extension<Store>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let post = load_post(&store, id).await?;

    if post.user != user.id {
        return Err(ApiError::NotAuthorized);
    }

    if !store.delete_post(id).await? {
        return Err(ApiError::NotFound(POST_NOT_FOUND));
    }

    info!(post_id = %id, "post removed");

    Ok(Json(MessageResponse {
        msg: "Post removed".to_string(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/posts/like/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Likes after the change, newest first", body = [Like]),
        (status = 400, description = "Post already liked", body = ErrorResponse),
        (status = 404, description = "Post or user not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "posts"
)]
#[instrument(skip(user, store), fields(user_id = %user.id))]
pub async fn like(
    user: CurrentUser,
    Path(id): Path<String>,
    store: Extension<Store>,
) -> Result<Json<Vec<Like>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let post = load_post(&store, id).await?;
    // the token may outlive its account
    load_user(&store, user).await?;

    if post.liked_by(user.id) || !store.add_like(id, user.id).await? {
        return Err(ApiError::BadRequest("Post already liked"));
    }

    Ok(Json(load_post(&store, id).await?.likes))
}

#[utoipa::path(
    put,
    path = "/api/posts/unlike/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Likes after the change, newest first", body = [Like]),
        (status = 400, description = "Post not liked", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "posts"
)]
#[instrument(skip(user, store), fields(user_id = %user.id))]
pub async fn unlike(
    user: CurrentUser,
    Path(id): Path<String>,
    store: Extension<Store>,
) -> Result<Json<Vec<Like>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let post = load_post(&store, id).await?;

    if !post.liked_by(user.id) || !store.remove_like(id, user.id).await? {
        return Err(ApiError::BadRequest("Post not liked"));
    }

    Ok(Json(load_post(&store, id).await?.likes))
}

#[utoipa::path(
    post,
    path = "/api/posts/comment/{id}",
    params(("id" = String, Path, description = "Post id")),
    request_body = TextRequest,
    responses(
        (status = 200, description = "Comments after the change, newest first", body = [Comment]),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "posts"
)]
#[instrument(skip(user, store, payload), fields(user_id = %user.id))]
pub async fn comment(
    user: CurrentUser,
    Path(id): Path<String>,
    store: Extension<Store>,
    payload: Option<Json<TextRequest>>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let new_comment = authored(&store, user, payload).await?;

    store
        .add_comment(id, new_comment)
        .await?
        .ok_or(ApiError::NotFound(POST_NOT_FOUND))?;

    Ok(Json(load_post(&store, id).await?.comments))
}

#[utoipa::path(
    delete,
    path = "/api/posts/comment/{id}/{comment_id}",
    params(
        ("id" = String, Path, description = "Post id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Remaining comments, newest first", body = [Comment]),
        (status = 401, description = "Not the comment author, or missing token", body = ErrorResponse),
        (status = 404, description = "Post or comment not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "posts"
)]
#[instrument(skip(user, store), fields(user_id = %user.id))]
pub async fn delete_comment(
    user: CurrentUser,
    Path((id, comment_id)): Path<(String, String)>,
    store: Extension<Store>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let comment_id = parse_id(&comment_id, COMMENT_NOT_FOUND)?;
    let post = load_post(&store, id).await?;

    let comment = post
        .comment(comment_id)
        .ok_or(ApiError::NotFound(COMMENT_NOT_FOUND))?;

    if comment.user != user.id {
        return Err(ApiError::NotAuthorized);
    }

    if !store.delete_comment(id, comment_id).await? {
        return Err(ApiError::NotFound(COMMENT_NOT_FOUND));
    }

    Ok(Json(load_post(&store, id).await?.comments))
}
