use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;

/// Sentinel owner ID selecting the public feed in
/// [`SnippetRepository::latest_all`](crate::repository::SnippetRepository::latest_all).
pub const PUBLIC_FEED: i64 = -1;

/// A registered account. The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: i64,
}

/// A published snippet. Timestamps are unix seconds; an expired snippet
/// (`expires_at <= now`) is invisible to every query path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub owner_id: i64,
    pub is_public: bool,
}

/// Closed error set returned by the repositories. Handlers match these
/// variants exhaustively; anything unrecognized is treated as a system error.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NoRecord,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("email or password mismatch")]
    Auth,
    #[error("unknown snippet owner")]
    UnknownOwner,
    #[error("password hashing error: {0}")]
    Password(#[from] AuthError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
