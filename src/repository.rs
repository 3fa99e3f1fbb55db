use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{RepoError, Snippet, User};

/// Persistence contract for user accounts. Implemented by the SQLite store
/// for production and by an in-memory double for tests; handlers only ever
/// see the trait object.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account, hashing the password. Fails with
    /// [`RepoError::DuplicateEmail`] when the email is already registered.
    async fn insert(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, RepoError>;

    /// Fetch an account by ID. [`RepoError::NoRecord`] when absent.
    async fn get(&self, id: i64) -> Result<User, RepoError>;

    /// Verify credentials and return the account ID. Unknown email and wrong
    /// password both yield [`RepoError::Auth`] so callers cannot tell them
    /// apart.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, RepoError>;
}

/// Persistence contract for snippets. Expiration is enforced inside every
/// read and write path, never by a background sweep.
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Insert a snippet expiring `expire_days` days from now. Fails with
    /// [`RepoError::UnknownOwner`] when `owner_id` has no matching user.
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expire_days: u32,
        is_public: bool,
        owner_id: i64,
    ) -> Result<i64, RepoError>;

    /// Fetch a non-expired snippet by ID. [`RepoError::NoRecord`] when the
    /// row is missing or expired.
    async fn get(&self, id: i64) -> Result<Snippet, RepoError>;

    /// Update title, content, and visibility of the caller's own snippet.
    /// Affecting zero rows (missing, expired, or not owned) is
    /// [`RepoError::NoRecord`].
    async fn update(
        &self,
        id: i64,
        title: &str,
        content: &str,
        is_public: bool,
        owner_id: i64,
    ) -> Result<(), RepoError>;

    /// Delete the caller's own snippet; zero rows is [`RepoError::NoRecord`].
    async fn delete(&self, id: i64, owner_id: i64) -> Result<(), RepoError>;

    /// Return up to `page_size` non-expired snippets ordered newest first.
    /// `owner_id == PUBLIC_FEED` selects public snippets from any owner;
    /// `owner_id >= 0` selects that owner's snippets regardless of
    /// visibility. Page 1 starts at offset 0; out-of-range pages yield an
    /// empty result.
    async fn latest_all(
        &self,
        owner_id: i64,
        page_size: u32,
        page: u32,
    ) -> Result<Vec<Snippet>, RepoError>;
}

pub type UserRepo = Arc<dyn UserRepository>;
pub type SnippetRepo = Arc<dyn SnippetRepository>;
