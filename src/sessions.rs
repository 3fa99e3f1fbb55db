use serde::{Deserialize, Serialize};
use tower_sessions::{session::Error as SessionError, Session};

pub const SESSION_USER_KEY: &str = "auth.user";
pub const SESSION_CSRF_KEY: &str = "security.csrf";
pub const SESSION_FLASH_KEY: &str = "app.flash";

/// The two values a login stores in the session: the account ID and the
/// per-login logout confirmation hash. The hash exists only here, never in
/// the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i64,
    pub logout_hash: String,
}

impl SessionUser {
    pub fn new(user_id: i64, logout_hash: String) -> Self {
        Self {
            user_id,
            logout_hash,
        }
    }
}

pub async fn store_user(session: &Session, user: &SessionUser) -> Result<(), SessionError> {
    session.insert(SESSION_USER_KEY, user).await
}

pub async fn clear_user(session: &Session) -> Result<(), SessionError> {
    let _ = session.remove::<SessionUser>(SESSION_USER_KEY).await?;
    Ok(())
}

pub async fn current_user(session: &Session) -> Result<Option<SessionUser>, SessionError> {
    session.get(SESSION_USER_KEY).await
}

/// Append a one-time message shown on the next rendered page.
pub async fn push_flash(session: &Session, message: &str) -> Result<(), SessionError> {
    let mut flashes: Vec<String> = session
        .get(SESSION_FLASH_KEY)
        .await?
        .unwrap_or_default();
    flashes.push(message.to_owned());
    session.insert(SESSION_FLASH_KEY, &flashes).await
}

/// Drain all pending flash messages, clearing them from the session.
pub async fn take_flashes(session: &Session) -> Result<Vec<String>, SessionError> {
    Ok(session
        .remove::<Vec<String>>(SESSION_FLASH_KEY)
        .await?
        .unwrap_or_default())
}
