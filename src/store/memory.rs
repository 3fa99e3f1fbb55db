use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::{self, AuthError},
    models::{RepoError, Snippet, User, PUBLIC_FEED},
    repository::{SnippetRepository, UserRepository},
};

const SECONDS_PER_DAY: i64 = 86_400;

struct StoredUser {
    user: User,
    password_hash: String,
}

/// In-memory [`UserRepository`] double with the same observable semantics as
/// the SQLite store, including real password hashing.
pub struct MemoryUserStore {
    users: Mutex<Vec<StoredUser>>,
    next_id: AtomicI64,
    pepper: Option<String>,
}

impl MemoryUserStore {
    pub fn new(pepper: Option<String>) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            pepper,
        }
    }

    fn contains(&self, id: i64) -> bool {
        self.users
            .lock()
            .expect("user store lock poisoned")
            .iter()
            .any(|stored| stored.user.id == id)
    }
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn insert(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, RepoError> {
        let password_hash = auth::hash_password(password, self.pepper.as_deref()).await?;

        let mut users = self.users.lock().expect("user store lock poisoned");
        if users.iter().any(|stored| stored.user.email == email) {
            return Err(RepoError::DuplicateEmail);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        users.push(StoredUser {
            user: User {
                id,
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                email: email.to_owned(),
                created_at: OffsetDateTime::now_utc().unix_timestamp(),
            },
            password_hash,
        });

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<User, RepoError> {
        self.users
            .lock()
            .expect("user store lock poisoned")
            .iter()
            .find(|stored| stored.user.id == id)
            .map(|stored| stored.user.clone())
            .ok_or(RepoError::NoRecord)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, RepoError> {
        let found = {
            let users = self.users.lock().expect("user store lock poisoned");
            users
                .iter()
                .find(|stored| stored.user.email == email)
                .map(|stored| (stored.user.id, stored.password_hash.clone()))
        };

        let Some((id, stored_hash)) = found else {
            return Err(RepoError::Auth);
        };

        match auth::verify_password(password, &stored_hash, self.pepper.as_deref()).await {
            Ok(()) => Ok(id),
            Err(AuthError::InvalidCredentials) => Err(RepoError::Auth),
            Err(err) => Err(RepoError::Password(err)),
        }
    }
}

/// In-memory [`SnippetRepository`] double. Shares the user store so inserts
/// can reject unknown owners the way the foreign key does.
pub struct MemorySnippetStore {
    snippets: Mutex<Vec<Snippet>>,
    next_id: AtomicI64,
    users: Arc<MemoryUserStore>,
}

impl MemorySnippetStore {
    pub fn new(users: Arc<MemoryUserStore>) -> Self {
        Self {
            snippets: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            users,
        }
    }

    /// Backdate a snippet so tests can observe expiration behavior.
    pub fn force_expire(&self, id: i64) {
        let mut snippets = self.snippets.lock().expect("snippet store lock poisoned");
        if let Some(snippet) = snippets.iter_mut().find(|s| s.id == id) {
            snippet.expires_at = snippet.created_at - 1;
        }
    }
}

fn not_expired(snippet: &Snippet, now: i64) -> bool {
    snippet.expires_at > now
}

#[async_trait]
impl SnippetRepository for MemorySnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expire_days: u32,
        is_public: bool,
        owner_id: i64,
    ) -> Result<i64, RepoError> {
        if !self.users.contains(owner_id) {
            return Err(RepoError::UnknownOwner);
        }

        let created_at = OffsetDateTime::now_utc().unix_timestamp();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        self.snippets
            .lock()
            .expect("snippet store lock poisoned")
            .push(Snippet {
                id,
                title: title.to_owned(),
                content: content.to_owned(),
                created_at,
                expires_at: created_at + i64::from(expire_days) * SECONDS_PER_DAY,
                owner_id,
                is_public,
            });

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, RepoError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.snippets
            .lock()
            .expect("snippet store lock poisoned")
            .iter()
            .find(|snippet| snippet.id == id && not_expired(snippet, now))
            .cloned()
            .ok_or(RepoError::NoRecord)
    }

    async fn update(
        &self,
        id: i64,
        title: &str,
        content: &str,
        is_public: bool,
        owner_id: i64,
    ) -> Result<(), RepoError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut snippets = self.snippets.lock().expect("snippet store lock poisoned");

        match snippets
            .iter_mut()
            .find(|s| s.id == id && s.owner_id == owner_id && not_expired(s, now))
        {
            Some(snippet) => {
                snippet.title = title.to_owned();
                snippet.content = content.to_owned();
                snippet.is_public = is_public;
                Ok(())
            }
            None => Err(RepoError::NoRecord),
        }
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<(), RepoError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut snippets = self.snippets.lock().expect("snippet store lock poisoned");

        let before = snippets.len();
        snippets.retain(|s| !(s.id == id && s.owner_id == owner_id && not_expired(s, now)));

        if snippets.len() == before {
            return Err(RepoError::NoRecord);
        }

        Ok(())
    }

    async fn latest_all(
        &self,
        owner_id: i64,
        page_size: u32,
        page: u32,
    ) -> Result<Vec<Snippet>, RepoError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let offset = (page_size as usize) * (page as usize).saturating_sub(1);

        let mut visible: Vec<Snippet> = self
            .snippets
            .lock()
            .expect("snippet store lock poisoned")
            .iter()
            .filter(|s| not_expired(s, now))
            .filter(|s| {
                if owner_id == PUBLIC_FEED {
                    s.is_public
                } else {
                    s.owner_id == owner_id
                }
            })
            .cloned()
            .collect();

        visible.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(visible
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_stores() -> (Arc<MemoryUserStore>, MemorySnippetStore, i64) {
        let users = Arc::new(MemoryUserStore::new(None));
        let owner = users
            .insert("Conor", "McGregor", "conor@mail.com", "12345678")
            .await
            .unwrap();
        let snippets = MemorySnippetStore::new(users.clone());
        (users, snippets, owner)
    }

    #[tokio::test]
    async fn unknown_owner_rejected_like_a_foreign_key() {
        let (_users, snippets, _owner) = seeded_stores().await;
        let err = snippets
            .insert("title", "content", 1, true, 100_500)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::UnknownOwner));
    }

    #[tokio::test]
    async fn public_feed_never_contains_private_snippets() {
        let (_users, snippets, owner) = seeded_stores().await;
        snippets
            .insert("private", "content", 5, false, owner)
            .await
            .unwrap();
        snippets
            .insert("public", "content", 5, true, owner)
            .await
            .unwrap();

        for page in 1..4 {
            let feed = snippets.latest_all(PUBLIC_FEED, 10, page).await.unwrap();
            assert!(feed.iter().all(|s| s.is_public));
        }
    }

    #[tokio::test]
    async fn pagination_matches_the_window_formula() {
        let (_users, snippets, owner) = seeded_stores().await;
        let total = 23u32;
        let page_size = 10u32;
        for index in 0..total {
            snippets
                .insert(&format!("snippet-{index}"), "content", 1, true, owner)
                .await
                .unwrap();
        }

        for page in 1..5u32 {
            let feed = snippets
                .latest_all(PUBLIC_FEED, page_size, page)
                .await
                .unwrap();
            let expected = total
                .saturating_sub(page_size * (page - 1))
                .min(page_size);
            assert_eq!(feed.len() as u32, expected, "page {page}");

            // Descending creation order, ties broken by newest insert.
            for window in feed.windows(2) {
                assert!(
                    (window[0].created_at, window[0].id) > (window[1].created_at, window[1].id)
                );
            }
        }
    }

    #[tokio::test]
    async fn expired_snippets_disappear() {
        let (_users, snippets, owner) = seeded_stores().await;
        let id = snippets
            .insert("stale", "content", 1, true, owner)
            .await
            .unwrap();
        snippets.force_expire(id);

        assert!(matches!(snippets.get(id).await, Err(RepoError::NoRecord)));
        assert!(snippets
            .latest_all(PUBLIC_FEED, 10, 1)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            snippets.delete(id, owner).await,
            Err(RepoError::NoRecord)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let (users, _snippets, _owner) = seeded_stores().await;
        let err = users
            .insert("Other", "Person", "conor@mail.com", "12345678")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::DuplicateEmail));
    }

    #[tokio::test]
    async fn wrong_password_is_auth_not_a_system_error() {
        let (users, _snippets, owner) = seeded_stores().await;
        assert_eq!(
            users
                .authenticate("conor@mail.com", "12345678")
                .await
                .unwrap(),
            owner
        );
        assert!(matches!(
            users.authenticate("conor@mail.com", "87654321").await,
            Err(RepoError::Auth)
        ));
    }
}
