//! # Devconnector
//!
//! Backend for a small developer social network: accounts, developer
//! profiles, and posts with likes and comments.
//!
//! ## Authentication
//!
//! Registration and login return a signed HS256 token whose claims carry the
//! user id (`{"user":{"id":..},"iat":..,"exp":..}`). Clients send it back raw in
//! the `x-auth-token` header. Passwords are stored as bcrypt hashes and never
//! leave the store layer.
//!
//! ## Storage
//!
//! PostgreSQL when `--dsn` is given, otherwise an in-memory store that is lost
//! on restart.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
