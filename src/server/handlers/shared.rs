use axum::response::Response;
use tower_sessions::Session;
use tracing::error;

use crate::{
    app_state::AppState,
    csrf,
    server::middleware::AuthUser,
    sessions::take_flashes,
    templates::{LayoutContext, NavUser},
};

use crate::server::utils::{invalid_csrf_response, server_error_response};

/// Build a [`LayoutContext`] for a page render, draining any pending flash
/// messages. A session read failure drops the flashes rather than the page.
pub async fn page_layout(
    state: &AppState,
    session: &Session,
    auth_user: Option<&AuthUser>,
    title: &str,
) -> LayoutContext {
    let flashes = match take_flashes(session).await {
        Ok(flashes) => flashes,
        Err(err) => {
            error!(target: "sessions", %err, "failed to drain flash messages");
            Vec::new()
        }
    };

    let nav_user = auth_user.map(|user| NavUser {
        first_name: user.first_name.clone(),
        logout_hash: user.logout_hash.clone(),
    });

    LayoutContext::new(state, title, nav_user, flashes)
}

/// Fetch or create the session's CSRF token for embedding in a form.
pub async fn form_token(session: &Session) -> Result<String, Response> {
    csrf::ensure_csrf_token(session).await.map_err(|err| {
        error!(target: "csrf", %err, "failed to issue CSRF token");
        server_error_response()
    })
}

/// Validate a submitted CSRF token. A mismatch is a hard 403; a session
/// failure is a server error.
pub async fn check_csrf(session: &Session, provided: &str) -> Result<(), Response> {
    match csrf::validate_csrf_token(session, provided).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(invalid_csrf_response()),
        Err(err) => {
            error!(target: "csrf", %err, "failed to validate CSRF token");
            Err(server_error_response())
        }
    }
}

/// Rotate the CSRF token after a state-changing form succeeds. Rotation
/// failure is logged but never blocks the success path.
pub async fn rotate_token(session: &Session) {
    if let Err(err) = csrf::rotate_csrf_token(session).await {
        error!(target: "csrf", %err, "failed to rotate CSRF token");
    }
}
