use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{error, info};

use crate::{
    app_state::AppState,
    models::RepoError,
    sessions::{clear_user, current_user},
};

use super::utils::server_error_response;

/// The authenticated account attached to the request once the session has
/// been resolved against the database. Absence means an anonymous request.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub logout_hash: String,
}

/// Resolve the session's stored user ID against the user repository and
/// attach an [`AuthUser`] extension for downstream handlers. A session that
/// points at a deleted account is cleared and the request continues
/// anonymously; a session read failure also degrades to anonymous.
pub async fn resolve_user(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let session_user = match current_user(&session).await {
        Ok(user) => user,
        Err(err) => {
            error!(target: "sessions", %err, "failed to read session, continuing anonymously");
            if let Err(err) = session.flush().await {
                error!(target: "sessions", %err, "failed to discard unreadable session");
            }
            None
        }
    };

    if let Some(session_user) = session_user {
        match state.users().get(session_user.user_id).await {
            Ok(user) => {
                request.extensions_mut().insert(AuthUser {
                    id: user.id,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    email: user.email,
                    logout_hash: session_user.logout_hash,
                });
            }
            Err(RepoError::NoRecord) => {
                info!(
                    target: "auth",
                    user_id = session_user.user_id,
                    "session references a missing account, clearing it"
                );
                if let Err(err) = clear_user(&session).await {
                    error!(target: "sessions", %err, "failed to clear stale session user");
                }
            }
            Err(err) => {
                error!(target: "auth", %err, "failed to load account for session");
                return server_error_response();
            }
        }
    }

    next.run(request).await
}

/// Gate for routes that require a signed-in user. Anonymous requests are
/// redirected to the public feed.
pub async fn require_auth(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthUser>().is_none() {
        return Redirect::to("/").into_response();
    }
    next.run(request).await
}

/// Gate for routes that only make sense for anonymous visitors, such as the
/// signup and login pages. Signed-in users are redirected to the public feed.
pub async fn require_anonymous(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthUser>().is_some() {
        return Redirect::to("/").into_response();
    }
    next.run(request).await
}
