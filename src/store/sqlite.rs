use async_trait::async_trait;
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::{
    auth::{self, AuthError},
    models::{RepoError, Snippet, User},
    repository::{SnippetRepository, UserRepository},
};

const SECONDS_PER_DAY: i64 = 86_400;

/// SQLite extended result code for a UNIQUE constraint violation.
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
/// SQLite extended result code for a FOREIGN KEY constraint violation.
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";

fn has_error_code(err: &sqlx::Error, code: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(code))
}

/// User accounts backed by the `users` table.
pub struct SqliteUserStore {
    pool: SqlitePool,
    pepper: Option<String>,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool, pepper: Option<String>) -> Self {
        Self { pool, pepper }
    }
}

#[async_trait]
impl UserRepository for SqliteUserStore {
    async fn insert(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, RepoError> {
        let password_hash = auth::hash_password(password, self.pepper.as_deref()).await?;
        let created_at = OffsetDateTime::now_utc().unix_timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(&password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if has_error_code(&err, SQLITE_CONSTRAINT_UNIQUE) {
                RepoError::DuplicateEmail
            } else {
                RepoError::Database(err)
            }
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NoRecord)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, RepoError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, stored_hash)) = row else {
            return Err(RepoError::Auth);
        };

        match auth::verify_password(password, &stored_hash, self.pepper.as_deref()).await {
            Ok(()) => Ok(id),
            Err(AuthError::InvalidCredentials) => Err(RepoError::Auth),
            Err(err) => Err(RepoError::Password(err)),
        }
    }
}

/// Snippets backed by the `snippets` table.
pub struct SqliteSnippetStore {
    pool: SqlitePool,
}

impl SqliteSnippetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepository for SqliteSnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expire_days: u32,
        is_public: bool,
        owner_id: i64,
    ) -> Result<i64, RepoError> {
        let created_at = OffsetDateTime::now_utc().unix_timestamp();
        let expires_at = created_at + i64::from(expire_days) * SECONDS_PER_DAY;

        let result = sqlx::query(
            r#"
            INSERT INTO snippets (title, content, created_at, expires_at, owner_id, is_public)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(created_at)
        .bind(expires_at)
        .bind(owner_id)
        .bind(is_public)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if has_error_code(&err, SQLITE_CONSTRAINT_FOREIGNKEY) {
                RepoError::UnknownOwner
            } else {
                RepoError::Database(err)
            }
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> Result<Snippet, RepoError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();

        sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created_at, expires_at, owner_id, is_public
            FROM snippets
            WHERE id = ? AND expires_at > ?
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
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

        let result = sqlx::query(
            r#"
            UPDATE snippets
            SET title = ?, content = ?, is_public = ?
            WHERE id = ? AND owner_id = ? AND expires_at > ?
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(is_public)
        .bind(id)
        .bind(owner_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NoRecord);
        }

        Ok(())
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<(), RepoError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let result =
            sqlx::query("DELETE FROM snippets WHERE id = ? AND owner_id = ? AND expires_at > ?")
                .bind(id)
                .bind(owner_id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
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
        let limit = i64::from(page_size);
        let offset = limit * (i64::from(page) - 1).max(0);

        let snippets = if owner_id == crate::models::PUBLIC_FEED {
            sqlx::query_as::<_, Snippet>(
                r#"
                SELECT id, title, content, created_at, expires_at, owner_id, is_public
                FROM snippets
                WHERE expires_at > ? AND is_public = 1
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(now)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Snippet>(
                r#"
                SELECT id, title, content, created_at, expires_at, owner_id, is_public
                FROM snippets
                WHERE expires_at > ? AND owner_id = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(now)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::models::PUBLIC_FEED;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        database::create_tables(&pool).await.expect("schema");
        pool
    }

    async fn seed_user(store: &SqliteUserStore, email: &str) -> i64 {
        store
            .insert("Conor", "McGregor", email, "12345678")
            .await
            .expect("insert user")
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let pool = test_pool().await;
        let users = SqliteUserStore::new(pool.clone(), None);
        let id = seed_user(&users, "conor@mail.com").await;

        let user = users.get(id).await.unwrap();
        assert_eq!(user.email, "conor@mail.com");
        assert_eq!(user.first_name, "Conor");

        let missing = users.get(id + 1).await.unwrap_err();
        assert!(matches!(missing, RepoError::NoRecord));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_sentinel() {
        let pool = test_pool().await;
        let users = SqliteUserStore::new(pool.clone(), None);
        seed_user(&users, "conor@mail.com").await;

        let err = users
            .insert("Other", "Person", "conor@mail.com", "12345678")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::DuplicateEmail));
    }

    #[tokio::test]
    async fn authenticate_never_distinguishes_email_from_password() {
        let pool = test_pool().await;
        let users = SqliteUserStore::new(pool.clone(), None);
        let id = seed_user(&users, "conor@mail.com").await;

        assert_eq!(
            users.authenticate("conor@mail.com", "12345678").await.unwrap(),
            id
        );
        assert!(matches!(
            users.authenticate("conor@mail.com", "wrong-pass").await,
            Err(RepoError::Auth)
        ));
        assert!(matches!(
            users.authenticate("nobody@mail.com", "12345678").await,
            Err(RepoError::Auth)
        ));
    }

    #[tokio::test]
    async fn snippet_expiration_round_trip() {
        let pool = test_pool().await;
        let users = SqliteUserStore::new(pool.clone(), None);
        let snippets = SqliteSnippetStore::new(pool.clone());
        let owner = seed_user(&users, "conor@mail.com").await;

        let id = snippets
            .insert("title", "content", 2, true, owner)
            .await
            .unwrap();
        let snippet = snippets.get(id).await.unwrap();
        assert_eq!(snippet.expires_at - snippet.created_at, 2 * SECONDS_PER_DAY);
        assert!(snippet.is_public);
    }

    #[tokio::test]
    async fn expired_snippets_are_invisible_everywhere() {
        let pool = test_pool().await;
        let users = SqliteUserStore::new(pool.clone(), None);
        let snippets = SqliteSnippetStore::new(pool.clone());
        let owner = seed_user(&users, "conor@mail.com").await;

        let id = snippets
            .insert("stale", "content", 1, true, owner)
            .await
            .unwrap();
        // Force the row into the past.
        sqlx::query("UPDATE snippets SET expires_at = created_at - 1 WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(matches!(snippets.get(id).await, Err(RepoError::NoRecord)));
        assert!(matches!(
            snippets.update(id, "t", "c", true, owner).await,
            Err(RepoError::NoRecord)
        ));
        assert!(matches!(
            snippets.delete(id, owner).await,
            Err(RepoError::NoRecord)
        ));
        assert!(snippets
            .latest_all(PUBLIC_FEED, 10, 1)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_owner_is_a_sentinel() {
        let pool = test_pool().await;
        let snippets = SqliteSnippetStore::new(pool.clone());

        let err = snippets
            .insert("title", "content", 1, true, 100_500)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::UnknownOwner));
    }

    #[tokio::test]
    async fn delete_rechecks_ownership() {
        let pool = test_pool().await;
        let users = SqliteUserStore::new(pool.clone(), None);
        let snippets = SqliteSnippetStore::new(pool.clone());
        let owner = seed_user(&users, "conor@mail.com").await;
        let other = seed_user(&users, "khabib@mail.com").await;

        let id = snippets
            .insert("title", "content", 1, false, owner)
            .await
            .unwrap();

        assert!(matches!(
            snippets.delete(id, other).await,
            Err(RepoError::NoRecord)
        ));
        snippets.delete(id, owner).await.unwrap();
        assert!(matches!(snippets.get(id).await, Err(RepoError::NoRecord)));
    }

    #[tokio::test]
    async fn public_feed_hides_private_snippets() {
        let pool = test_pool().await;
        let users = SqliteUserStore::new(pool.clone(), None);
        let snippets = SqliteSnippetStore::new(pool.clone());
        let owner = seed_user(&users, "conor@mail.com").await;

        snippets
            .insert("public", "content", 1, true, owner)
            .await
            .unwrap();
        snippets
            .insert("private", "content", 1, false, owner)
            .await
            .unwrap();

        let feed = snippets.latest_all(PUBLIC_FEED, 10, 1).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "public");

        let own = snippets.latest_all(owner, 10, 1).await.unwrap();
        assert_eq!(own.len(), 2);
    }

    #[tokio::test]
    async fn pagination_windows_are_disjoint_and_ordered() {
        let pool = test_pool().await;
        let users = SqliteUserStore::new(pool.clone(), None);
        let snippets = SqliteSnippetStore::new(pool.clone());
        let owner = seed_user(&users, "conor@mail.com").await;

        for index in 0..15 {
            snippets
                .insert(&format!("snippet-{index}"), "content", 1, true, owner)
                .await
                .unwrap();
        }

        let first = snippets.latest_all(PUBLIC_FEED, 10, 1).await.unwrap();
        let second = snippets.latest_all(PUBLIC_FEED, 10, 2).await.unwrap();
        let third = snippets.latest_all(PUBLIC_FEED, 10, 3).await.unwrap();

        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 5);
        assert!(third.is_empty());

        // Newest first: rows inserted within the same second fall back to id
        // order, so the last insert leads the feed.
        assert_eq!(first[0].title, "snippet-14");
        assert_eq!(second[4].title, "snippet-0");

        let first_ids: Vec<i64> = first.iter().map(|s| s.id).collect();
        assert!(second.iter().all(|s| !first_ids.contains(&s.id)));
    }
}
