use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::app_state::AppState;
use crate::server::handlers;
use crate::server::middleware::{require_anonymous, require_auth, resolve_user};

/// Construct the application's HTTP router with all routes and middleware
/// configured. The session store is generic so tests can run against the
/// in-memory store.
pub fn build_router<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    let authenticated_routes = Router::new()
        .route("/snippets", get(handlers::home::user_snippets_handler))
        .route(
            "/snippet/create",
            get(handlers::snippets::create_form_handler)
                .post(handlers::snippets::create_submit_handler),
        )
        .route(
            "/snippet/edit/:id",
            get(handlers::snippets::edit_form_handler)
                .post(handlers::snippets::edit_submit_handler),
        )
        .route(
            "/snippet/delete/:id",
            get(handlers::snippets::delete_snippet_handler),
        )
        .route("/user/logout", get(handlers::auth::logout_handler))
        .route_layer(from_fn(require_auth));

    let anonymous_routes = Router::new()
        .route(
            "/user/signup",
            get(handlers::auth::signup_form_handler).post(handlers::auth::signup_submit_handler),
        )
        .route(
            "/user/login",
            get(handlers::auth::login_form_handler).post(handlers::auth::login_submit_handler),
        )
        .route_layer(from_fn(require_anonymous));

    Router::new()
        .route("/", get(handlers::home::home_handler))
        .route("/snippet/:id", get(handlers::snippets::show_snippet_handler))
        .merge(authenticated_routes)
        .merge(anonymous_routes)
        .nest_service("/static", ServeDir::new("ui/static"))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(session_layer)
                .layer(from_fn_with_state(state.clone(), resolve_user)),
        )
        .with_state(state)
}
