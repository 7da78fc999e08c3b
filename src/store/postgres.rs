//! PostgreSQL backend.

use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use std::collections::HashMap;
use tracing::{info_span, Instrument, Span};
use uuid::Uuid;

use super::models::{
    Authored, Comment, InsertUserOutcome, Like, NewUser, Post, Profile, ProfileFields, Social,
    User, UserSummary,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

fn query_span(operation: &str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Apply `sql/schema.sql`; every statement is idempotent.
pub(super) async fn apply_schema(pool: &PgPool) -> Result<()> {
    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .instrument(query_span("DDL", statement))
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

pub(super) async fn ping(pool: &PgPool) -> Result<()> {
    let acquire_span = info_span!(
        "db.acquire",
        db.system = "postgresql",
        db.operation = "ACQUIRE"
    );
    let mut conn = pool
        .acquire()
        .instrument(acquire_span)
        .await
        .context("failed to acquire database connection")?;
    let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
    conn.ping()
        .instrument(ping_span)
        .await
        .context("failed to ping database")
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23503"),
        _ => false,
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        avatar: row.get("avatar"),
        password_hash: row.get("password"),
        date: row.get("date"),
    }
}

pub(super) async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let query = "SELECT id, name, email, avatar, password, date FROM users WHERE id = $1";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to lookup user by id")?;
    Ok(row.as_ref().map(user_from_row))
}

pub(super) async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let query = "SELECT id, name, email, avatar, password, date FROM users WHERE email = $1";
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to lookup user by email")?;
    Ok(row.as_ref().map(user_from_row))
}

pub(super) async fn insert_user(pool: &PgPool, new_user: NewUser) -> Result<InsertUserOutcome> {
    let query = r"
        INSERT INTO users (id, name, email, avatar, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, email, avatar, password, date
    ";
    let result = sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.avatar)
        .bind(&new_user.password_hash)
        .fetch_one(pool)
        .instrument(query_span("INSERT", query))
        .await;

    match result {
        Ok(row) => Ok(InsertUserOutcome::Created(user_from_row(&row))),
        Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

const PROFILE_SELECT: &str = r"
    SELECT p.id, p.user_id, u.name, u.avatar, p.company, p.website, p.location, p.bio,
           p.status, p.githubusername, p.skills, p.youtube, p.twitter, p.facebook,
           p.linkedin, p.instagram, p.date
    FROM profiles p
    JOIN users u ON u.id = p.user_id
";

fn profile_from_row(row: &PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        user: UserSummary {
            id: row.get("user_id"),
            name: row.get("name"),
            avatar: row.get("avatar"),
        },
        company: row.get("company"),
        website: row.get("website"),
        location: row.get("location"),
        bio: row.get("bio"),
        status: row.get("status"),
        githubusername: row.get("githubusername"),
        skills: row.get("skills"),
        social: Social {
            youtube: row.get("youtube"),
            twitter: row.get("twitter"),
            facebook: row.get("facebook"),
            linkedin: row.get("linkedin"),
            instagram: row.get("instagram"),
        },
        date: row.get("date"),
    }
}

pub(super) async fn find_profile_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>> {
    let query = format!("{PROFILE_SELECT} WHERE p.user_id = $1");
    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to lookup profile")?;
    Ok(row.as_ref().map(profile_from_row))
}

pub(super) async fn list_profiles(pool: &PgPool) -> Result<Vec<Profile>> {
    let query = format!("{PROFILE_SELECT} ORDER BY p.date ASC, p.seq ASC");
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to list profiles")?;
    Ok(rows.iter().map(profile_from_row).collect())
}

pub(super) async fn upsert_profile(pool: &PgPool, fields: ProfileFields) -> Result<Option<Profile>> {
    // Optional scalars only overwrite when provided; social links are replaced.
    let query = r"
        INSERT INTO profiles
            (id, user_id, company, website, location, bio, status, githubusername, skills,
             youtube, twitter, facebook, linkedin, instagram)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (user_id) DO UPDATE SET
            company = COALESCE(EXCLUDED.company, profiles.company),
            website = COALESCE(EXCLUDED.website, profiles.website),
            location = COALESCE(EXCLUDED.location, profiles.location),
            bio = COALESCE(EXCLUDED.bio, profiles.bio),
            status = EXCLUDED.status,
            githubusername = COALESCE(EXCLUDED.githubusername, profiles.githubusername),
            skills = EXCLUDED.skills,
            youtube = EXCLUDED.youtube,
            twitter = EXCLUDED.twitter,
            facebook = EXCLUDED.facebook,
            linkedin = EXCLUDED.linkedin,
            instagram = EXCLUDED.instagram
    ";
    let result = sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(fields.user_id)
        .bind(&fields.company)
        .bind(&fields.website)
        .bind(&fields.location)
        .bind(&fields.bio)
        .bind(&fields.status)
        .bind(&fields.githubusername)
        .bind(&fields.skills)
        .bind(&fields.social.youtube)
        .bind(&fields.social.twitter)
        .bind(&fields.social.facebook)
        .bind(&fields.social.linkedin)
        .bind(&fields.social.instagram)
        .execute(pool)
        .instrument(query_span("INSERT", query))
        .await;

    match result {
        Ok(_) => find_profile_by_user(pool, fields.user_id).await,
        Err(err) if is_foreign_key_violation(&err) => Ok(None),
        Err(err) => Err(err).context("failed to upsert profile"),
    }
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        user: row.get("user_id"),
        text: row.get("text"),
        name: row.get("name"),
        avatar: row.get("avatar"),
        likes: Vec::new(),
        comments: Vec::new(),
        date: row.get("date"),
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        user: row.get("user_id"),
        text: row.get("text"),
        name: row.get("name"),
        avatar: row.get("avatar"),
        date: row.get("date"),
    }
}

/// Attach likes and comments (newest first) to already loaded posts.
async fn hydrate_posts(pool: &PgPool, mut posts: Vec<Post>) -> Result<Vec<Post>> {
    if posts.is_empty() {
        return Ok(posts);
    }
    let ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();

    let likes_query = r"
        SELECT post_id, user_id FROM post_likes
        WHERE post_id = ANY($1)
        ORDER BY created_at DESC, seq DESC
    ";
    let like_rows = sqlx::query(likes_query)
        .bind(&ids)
        .fetch_all(pool)
        .instrument(query_span("SELECT", likes_query))
        .await
        .context("failed to load likes")?;

    let comments_query = r"
        SELECT id, post_id, user_id, text, name, avatar, date FROM post_comments
        WHERE post_id = ANY($1)
        ORDER BY date DESC, seq DESC
    ";
    let comment_rows = sqlx::query(comments_query)
        .bind(&ids)
        .fetch_all(pool)
        .instrument(query_span("SELECT", comments_query))
        .await
        .context("failed to load comments")?;

    let mut likes: HashMap<Uuid, Vec<Like>> = HashMap::new();
    for row in &like_rows {
        likes
            .entry(row.get("post_id"))
            .or_default()
            .push(Like {
                user: row.get("user_id"),
            });
    }
    let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for row in &comment_rows {
        comments
            .entry(row.get("post_id"))
            .or_default()
            .push(comment_from_row(row));
    }

    for post in &mut posts {
        post.likes = likes.remove(&post.id).unwrap_or_default();
        post.comments = comments.remove(&post.id).unwrap_or_default();
    }
    Ok(posts)
}

pub(super) async fn insert_post(pool: &PgPool, new_post: Authored) -> Result<Post> {
    let query = r"
        INSERT INTO posts (id, user_id, text, name, avatar)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, text, name, avatar, date
    ";
    let row = sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(new_post.user_id)
        .bind(&new_post.text)
        .bind(&new_post.name)
        .bind(&new_post.avatar)
        .fetch_one(pool)
        .instrument(query_span("INSERT", query))
        .await
        .context("failed to insert post")?;
    Ok(post_from_row(&row))
}

pub(super) async fn list_posts(pool: &PgPool) -> Result<Vec<Post>> {
    let query = r"
        SELECT id, user_id, text, name, avatar, date FROM posts
        ORDER BY date DESC, seq DESC
    ";
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to list posts")?;
    hydrate_posts(pool, rows.iter().map(post_from_row).collect()).await
}

pub(super) async fn find_post(pool: &PgPool, id: Uuid) -> Result<Option<Post>> {
    let query = "SELECT id, user_id, text, name, avatar, date FROM posts WHERE id = $1";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to lookup post")?;
    let Some(row) = row else {
        return Ok(None);
    };
    Ok(hydrate_posts(pool, vec![post_from_row(&row)]).await?.pop())
}

pub(super) async fn delete_post(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM posts WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to delete post")?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn add_like(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<bool> {
    let query = r"
        INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)
        ON CONFLICT (post_id, user_id) DO NOTHING
    ";
    let result = sqlx::query(query)
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .instrument(query_span("INSERT", query))
        .await
        .context("failed to like post")?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn remove_like(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2";
    let result = sqlx::query(query)
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to unlike post")?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn add_comment(
    pool: &PgPool,
    post_id: Uuid,
    comment: Authored,
) -> Result<Option<Comment>> {
    let query = r"
        INSERT INTO post_comments (id, post_id, user_id, text, name, avatar)
        SELECT $1, p.id, $3, $4, $5, $6 FROM posts p WHERE p.id = $2
        RETURNING id, user_id, text, name, avatar, date
    ";
    let row = sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(comment.user_id)
        .bind(&comment.text)
        .bind(&comment.name)
        .bind(&comment.avatar)
        .fetch_optional(pool)
        .instrument(query_span("INSERT", query))
        .await
        .context("failed to insert comment")?;
    Ok(row.as_ref().map(comment_from_row))
}

pub(super) async fn delete_comment(pool: &PgPool, post_id: Uuid, comment_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM post_comments WHERE post_id = $1 AND id = $2";
    let result = sqlx::query(query)
        .bind(post_id)
        .bind(comment_id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to delete comment")?;
    Ok(result.rows_affected() > 0)
}
