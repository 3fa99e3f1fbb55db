use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, warn};

use crate::{
    app_state::AppState,
    models::{Snippet, PUBLIC_FEED},
    server::middleware::AuthUser,
    server::utils::{human_date, parse_page, server_error_response},
    templates::{HtmlTemplate, SnippetListTemplate, SnippetRow},
};

use super::shared::page_layout;

/// The raw `page` query parameter. Kept as a string so that non-numeric
/// values reach [`parse_page`] instead of being silently rejected by serde.
#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    page: Option<String>,
}

fn rows_for_display(snippets: Vec<Snippet>) -> Vec<SnippetRow> {
    snippets
        .into_iter()
        .map(|snippet| SnippetRow {
            id: snippet.id,
            title: snippet.title,
            created_display: human_date(snippet.created_at),
            is_public: snippet.is_public,
        })
        .collect()
}

/// `GET /` renders the paginated public feed, visible to everyone.
pub async fn home_handler(
    State(state): State<AppState>,
    session: Session,
    auth_user: Option<Extension<AuthUser>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = match parse_page(query.page.as_deref()) {
        Ok(page) => page,
        Err(err) => {
            warn!(target: "snippets", %err, "rejected public feed request");
            return server_error_response();
        }
    };

    let page_size = state.config().pagination.page_size;
    let snippets = match state.snippets().latest_all(PUBLIC_FEED, page_size, page).await {
        Ok(snippets) => snippets,
        Err(err) => {
            error!(target: "snippets", %err, "failed to load public feed");
            return server_error_response();
        }
    };

    let has_next = snippets.len() == page_size as usize;
    let rows = rows_for_display(snippets);
    let layout = page_layout(
        &state,
        &session,
        auth_user.as_ref().map(|ext| &ext.0),
        "Home",
    )
    .await;

    HtmlTemplate::new(SnippetListTemplate::new(
        layout,
        "Latest snippets",
        rows,
        "/",
        page,
        has_next,
    ))
    .into_response()
}

/// `GET /snippets` renders the signed-in user's own snippets, public and
/// private alike.
pub async fn user_snippets_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = match parse_page(query.page.as_deref()) {
        Ok(page) => page,
        Err(err) => {
            warn!(
                target: "snippets",
                user_id = auth_user.id,
                %err,
                "rejected personal feed request"
            );
            return server_error_response();
        }
    };

    let page_size = state.config().pagination.page_size;
    let snippets = match state
        .snippets()
        .latest_all(auth_user.id, page_size, page)
        .await
    {
        Ok(snippets) => snippets,
        Err(err) => {
            error!(
                target: "snippets",
                user_id = auth_user.id,
                %err,
                "failed to load personal feed"
            );
            return server_error_response();
        }
    };

    let has_next = snippets.len() == page_size as usize;
    let rows = rows_for_display(snippets);
    let layout = page_layout(&state, &session, Some(&auth_user), "My snippets").await;

    HtmlTemplate::new(SnippetListTemplate::new(
        layout,
        "My snippets",
        rows,
        "/snippets",
        page,
        has_next,
    ))
    .into_response()
}
