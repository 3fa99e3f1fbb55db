use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, warn};

use crate::{
    app_state::AppState,
    csrf::secure_compare,
    models::RepoError,
    server::middleware::AuthUser,
    server::utils::{human_date, not_found_response, server_error_response},
    sessions::push_flash,
    templates::{
        HtmlTemplate, SnippetFieldErrors, SnippetFormTemplate, SnippetFormValues,
        SnippetShowTemplate, SnippetView,
    },
    validation,
};

use super::shared::{check_csrf, form_token, page_layout, rotate_token};

const DEFAULT_EXPIRE_DAYS: &str = "365";

#[derive(Debug, Deserialize)]
pub(crate) struct SnippetForm {
    csrf_token: String,
    title: String,
    content: String,
    #[serde(default)]
    expire: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteQuery {
    hash: Option<String>,
}

/// `GET /snippet/:id` shows a single snippet. Private snippets are
/// indistinguishable from missing ones for anyone but their owner.
pub async fn show_snippet_handler(
    State(state): State<AppState>,
    session: Session,
    auth_user: Option<Extension<AuthUser>>,
    Path(id): Path<i64>,
) -> Response {
    if id < 1 {
        return not_found_response();
    }

    let snippet = match state.snippets().get(id).await {
        Ok(snippet) => snippet,
        Err(RepoError::NoRecord) => return not_found_response(),
        Err(err) => {
            error!(target: "snippets", snippet_id = id, %err, "failed to load snippet");
            return server_error_response();
        }
    };

    let auth_user = auth_user.map(|ext| ext.0);
    let owned = auth_user
        .as_ref()
        .is_some_and(|user| user.id == snippet.owner_id);

    if !snippet.is_public && !owned {
        return not_found_response();
    }

    let owner_hash = if owned {
        auth_user
            .as_ref()
            .map(|user| user.logout_hash.clone())
            .unwrap_or_default()
    } else {
        String::new()
    };

    let view = SnippetView {
        id: snippet.id,
        title: snippet.title.clone(),
        content: snippet.content,
        created_display: human_date(snippet.created_at),
        expires_display: human_date(snippet.expires_at),
        is_public: snippet.is_public,
        owned,
        owner_hash,
    };

    let layout = page_layout(&state, &session, auth_user.as_ref(), &snippet.title).await;
    HtmlTemplate::new(SnippetShowTemplate::new(layout, view)).into_response()
}

/// `GET /snippet/create` renders the empty creation form.
pub async fn create_form_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(auth_user): Extension<AuthUser>,
) -> Response {
    let csrf_token = match form_token(&session).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let layout = page_layout(&state, &session, Some(&auth_user), "Create snippet").await;
    let form = SnippetFormValues {
        expire: DEFAULT_EXPIRE_DAYS.to_string(),
        kind: "Public".to_string(),
        ..SnippetFormValues::default()
    };

    HtmlTemplate::new(SnippetFormTemplate::new(
        layout,
        "Create a new snippet",
        "/snippet/create",
        csrf_token,
        true,
        form,
    ))
    .into_response()
}

/// `POST /snippet/create` validates the form and inserts the snippet.
/// Validation failures re-render the form with per-field messages.
pub async fn create_submit_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(auth_user): Extension<AuthUser>,
    Form(form): Form<SnippetForm>,
) -> Response {
    if let Err(response) = check_csrf(&session, &form.csrf_token).await {
        warn!(target: "snippets", user_id = auth_user.id, "invalid CSRF token on create");
        return response;
    }

    let mut errors = SnippetFieldErrors {
        title: validation::required(&form.title),
        content: validation::required(&form.content),
        ..SnippetFieldErrors::default()
    };

    let expire_days = match validation::parse_expire_days(&form.expire) {
        Ok(days) => Some(days),
        Err(message) => {
            errors.expire = Some(message);
            None
        }
    };

    let is_public = match validation::parse_snippet_kind(&form.kind) {
        Ok(is_public) => Some(is_public),
        Err(message) => {
            errors.kind = Some(message);
            None
        }
    };

    if !errors.is_empty() {
        let csrf_token = match form_token(&session).await {
            Ok(token) => token,
            Err(response) => return response,
        };
        let layout = page_layout(&state, &session, Some(&auth_user), "Create snippet").await;
        let values = SnippetFormValues {
            title: form.title,
            content: form.content,
            expire: form.expire,
            kind: form.kind,
        };
        return HtmlTemplate::new(
            SnippetFormTemplate::new(
                layout,
                "Create a new snippet",
                "/snippet/create",
                csrf_token,
                true,
                values,
            )
            .with_field_errors(errors),
        )
        .into_response();
    }

    let (expire_days, is_public) = match (expire_days, is_public) {
        (Some(days), Some(is_public)) => (days, is_public),
        _ => return server_error_response(),
    };

    let snippet_id = match state
        .snippets()
        .insert(
            form.title.trim(),
            &form.content,
            expire_days,
            is_public,
            auth_user.id,
        )
        .await
    {
        Ok(id) => id,
        Err(err) => {
            error!(target: "snippets", user_id = auth_user.id, %err, "failed to insert snippet");
            return server_error_response();
        }
    };

    info!(
        target: "snippets",
        user_id = auth_user.id,
        snippet_id,
        public = is_public,
        "snippet created"
    );

    if let Err(err) = push_flash(&session, "Snippet successfully created").await {
        error!(target: "sessions", %err, "failed to record flash message");
    }
    rotate_token(&session).await;

    Redirect::to("/snippets").into_response()
}

/// `GET /snippet/edit/:id` renders the edit form, prefilled with the current
/// title, content, and visibility. Only the owner may edit; anyone else gets
/// a 403 once the snippet is known to exist.
pub async fn edit_form_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Response {
    if id < 1 {
        return not_found_response();
    }

    let snippet = match state.snippets().get(id).await {
        Ok(snippet) => snippet,
        Err(RepoError::NoRecord) => return not_found_response(),
        Err(err) => {
            error!(target: "snippets", snippet_id = id, %err, "failed to load snippet for edit");
            return server_error_response();
        }
    };

    if snippet.owner_id != auth_user.id {
        warn!(
            target: "snippets",
            user_id = auth_user.id,
            snippet_id = id,
            "refused edit of another user's snippet"
        );
        return (
            axum::http::StatusCode::FORBIDDEN,
            "You are not allowed to edit this snippet.",
        )
            .into_response();
    }

    let csrf_token = match form_token(&session).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let layout = page_layout(&state, &session, Some(&auth_user), "Edit snippet").await;
    let form = SnippetFormValues {
        title: snippet.title,
        content: snippet.content,
        expire: String::new(),
        kind: if snippet.is_public {
            "Public".to_string()
        } else {
            "Private".to_string()
        },
    };

    HtmlTemplate::new(SnippetFormTemplate::new(
        layout,
        "Edit snippet",
        format!("/snippet/edit/{id}"),
        csrf_token,
        false,
        form,
    ))
    .into_response()
}

/// `POST /snippet/edit/:id` validates and applies the update. Expiration is
/// never editable; the stored deadline stays as it was.
pub async fn edit_submit_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Form(form): Form<SnippetForm>,
) -> Response {
    if id < 1 {
        return not_found_response();
    }

    if let Err(response) = check_csrf(&session, &form.csrf_token).await {
        warn!(target: "snippets", user_id = auth_user.id, snippet_id = id, "invalid CSRF token on edit");
        return response;
    }

    let mut errors = SnippetFieldErrors {
        title: validation::required(&form.title),
        content: validation::required(&form.content),
        ..SnippetFieldErrors::default()
    };

    let is_public = match validation::parse_snippet_kind(&form.kind) {
        Ok(is_public) => Some(is_public),
        Err(message) => {
            errors.kind = Some(message);
            None
        }
    };

    if !errors.is_empty() {
        let csrf_token = match form_token(&session).await {
            Ok(token) => token,
            Err(response) => return response,
        };
        let layout = page_layout(&state, &session, Some(&auth_user), "Edit snippet").await;
        let values = SnippetFormValues {
            title: form.title,
            content: form.content,
            expire: String::new(),
            kind: form.kind,
        };
        return HtmlTemplate::new(
            SnippetFormTemplate::new(
                layout,
                "Edit snippet",
                format!("/snippet/edit/{id}"),
                csrf_token,
                false,
                values,
            )
            .with_field_errors(errors),
        )
        .into_response();
    }

    let Some(is_public) = is_public else {
        return server_error_response();
    };

    match state
        .snippets()
        .update(id, form.title.trim(), &form.content, is_public, auth_user.id)
        .await
    {
        Ok(()) => {}
        Err(RepoError::NoRecord) => return not_found_response(),
        Err(err) => {
            error!(target: "snippets", snippet_id = id, %err, "failed to update snippet");
            return server_error_response();
        }
    }

    info!(target: "snippets", user_id = auth_user.id, snippet_id = id, "snippet updated");

    if let Err(err) = push_flash(&session, "Snippet successfully updated").await {
        error!(target: "sessions", %err, "failed to record flash message");
    }
    rotate_token(&session).await;

    Redirect::to("/snippets").into_response()
}

/// `GET /snippet/delete/:id` deletes the snippet when the confirmation hash
/// matches the session's logout hash. A missing or wrong hash is answered
/// with 404, the same as a snippet that does not exist.
pub async fn delete_snippet_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    if id < 1 {
        return not_found_response();
    }

    let hash_matches = query
        .hash
        .as_deref()
        .is_some_and(|hash| secure_compare(&auth_user.logout_hash, hash));

    if !hash_matches {
        warn!(
            target: "snippets",
            user_id = auth_user.id,
            snippet_id = id,
            "delete confirmation hash mismatch"
        );
        return not_found_response();
    }

    match state.snippets().delete(id, auth_user.id).await {
        Ok(()) => {}
        Err(RepoError::NoRecord) => return not_found_response(),
        Err(err) => {
            error!(target: "snippets", snippet_id = id, %err, "failed to delete snippet");
            return server_error_response();
        }
    }

    info!(target: "snippets", user_id = auth_user.id, snippet_id = id, "snippet deleted");

    if let Err(err) = push_flash(&session, "Snippet successfully deleted").await {
        error!(target: "sessions", %err, "failed to record flash message");
    }

    Redirect::to("/").into_response()
}
