//! Document store for users, profiles and posts.
//!
//! Two backends share one API: PostgreSQL (selected with `--dsn`) and an
//! in-memory store for development and tests. Handlers only see [`Store`].

pub mod memory;
pub mod models;
mod postgres;

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{
    Authored, Comment, InsertUserOutcome, Like, NewUser, Post, Profile, ProfileFields, Social,
    User, UserSummary,
};

#[derive(Debug, Clone)]
pub enum Store {
    Postgres(PgPool),
    Memory(MemoryStore),
}

impl Store {
    /// Connect to PostgreSQL and make sure the schema exists.
    ///
    /// # Errors
    /// Returns an error if the connection or the schema bootstrap fails.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        postgres::apply_schema(&pool)
            .await
            .context("Failed to apply database schema")?;

        info!("PostgreSQL connected");

        Ok(Self::Postgres(pool))
    }

    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Postgres(pool) => postgres::ping(pool).await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        match self {
            Self::Postgres(pool) => postgres::find_user_by_id(pool, id).await,
            Self::Memory(memory) => Ok(memory.find_user_by_id(id).await),
        }
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        match self {
            Self::Postgres(pool) => postgres::find_user_by_email(pool, email).await,
            Self::Memory(memory) => Ok(memory.find_user_by_email(email).await),
        }
    }

    /// Insert a user; a taken email is an outcome, not an error.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn insert_user(&self, new_user: NewUser) -> Result<InsertUserOutcome> {
        match self {
            Self::Postgres(pool) => postgres::insert_user(pool, new_user).await,
            Self::Memory(memory) => Ok(memory.insert_user(new_user).await),
        }
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
        match self {
            Self::Postgres(pool) => postgres::find_profile_by_user(pool, user_id).await,
            Self::Memory(memory) => Ok(memory.find_profile_by_user(user_id).await),
        }
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        match self {
            Self::Postgres(pool) => postgres::list_profiles(pool).await,
            Self::Memory(memory) => Ok(memory.list_profiles().await),
        }
    }

    /// Create the caller's profile or update it in place.
    ///
    /// Returns `None` only when the owning user no longer exists.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn upsert_profile(&self, fields: ProfileFields) -> Result<Option<Profile>> {
        match self {
            Self::Postgres(pool) => postgres::upsert_profile(pool, fields).await,
            Self::Memory(memory) => Ok(memory.upsert_profile(fields).await),
        }
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn insert_post(&self, new_post: Authored) -> Result<Post> {
        match self {
            Self::Postgres(pool) => postgres::insert_post(pool, new_post).await,
            Self::Memory(memory) => Ok(memory.insert_post(new_post).await),
        }
    }

    /// All posts, newest first.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        match self {
            Self::Postgres(pool) => postgres::list_posts(pool).await,
            Self::Memory(memory) => Ok(memory.list_posts().await),
        }
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        match self {
            Self::Postgres(pool) => postgres::find_post(pool, id).await,
            Self::Memory(memory) => Ok(memory.find_post(id).await),
        }
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn delete_post(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(pool) => postgres::delete_post(pool, id).await,
            Self::Memory(memory) => Ok(memory.delete_post(id).await),
        }
    }

    /// Returns `false` when the user already liked the post.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(pool) => postgres::add_like(pool, post_id, user_id).await,
            Self::Memory(memory) => Ok(memory.add_like(post_id, user_id).await),
        }
    }

    /// Returns `false` when there was no like to remove.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(pool) => postgres::remove_like(pool, post_id, user_id).await,
            Self::Memory(memory) => Ok(memory.remove_like(post_id, user_id).await),
        }
    }

    /// Returns `None` when the post does not exist.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn add_comment(&self, post_id: Uuid, comment: Authored) -> Result<Option<Comment>> {
        match self {
            Self::Postgres(pool) => postgres::add_comment(pool, post_id, comment).await,
            Self::Memory(memory) => Ok(memory.add_comment(post_id, comment).await),
        }
    }

    /// # Errors
    /// Returns an error if the backend fails.
    pub async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(pool) => postgres::delete_comment(pool, post_id, comment_id).await,
            Self::Memory(memory) => Ok(memory.delete_comment(post_id, comment_id).await),
        }
    }
}
