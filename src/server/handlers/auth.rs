use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, warn};

use crate::{
    app_state::AppState,
    auth::{generate_logout_hash, randomized_backoff},
    csrf::secure_compare,
    models::RepoError,
    server::middleware::AuthUser,
    server::utils::server_error_response,
    sessions::{push_flash, store_user, SessionUser},
    templates::{
        HtmlTemplate, LoginFieldErrors, LoginTemplate, SignupFieldErrors, SignupFormValues,
        SignupTemplate,
    },
    validation,
};

use super::shared::{check_csrf, form_token, page_layout, rotate_token};

#[derive(Debug, Deserialize)]
pub(crate) struct SignupForm {
    csrf_token: String,
    firstname: String,
    lastname: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    csrf_token: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogoutQuery {
    hash: Option<String>,
}

async fn render_signup_page(
    state: &AppState,
    session: &Session,
    values: SignupFormValues,
    errors: SignupFieldErrors,
) -> Response {
    let csrf_token = match form_token(session).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let layout = page_layout(state, session, None, "Sign up").await;
    HtmlTemplate::new(
        SignupTemplate::new(layout, csrf_token)
            .with_form(values)
            .with_field_errors(errors),
    )
    .into_response()
}

async fn render_login_page(
    state: &AppState,
    session: &Session,
    email: &str,
    errors: LoginFieldErrors,
) -> Response {
    let csrf_token = match form_token(session).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let layout = page_layout(state, session, None, "Sign in").await;
    HtmlTemplate::new(
        LoginTemplate::new(layout, csrf_token)
            .with_email(email)
            .with_field_errors(errors),
    )
    .into_response()
}

/// `GET /user/signup` renders the empty registration form.
pub async fn signup_form_handler(State(state): State<AppState>, session: Session) -> Response {
    render_signup_page(
        &state,
        &session,
        SignupFormValues::default(),
        SignupFieldErrors::default(),
    )
    .await
}

/// `POST /user/signup` validates the registration form and creates the
/// account. The password is never echoed back on a failed attempt.
pub async fn signup_submit_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    if let Err(response) = check_csrf(&session, &form.csrf_token).await {
        warn!(target: "auth", "invalid CSRF token on signup");
        return response;
    }

    let errors = SignupFieldErrors {
        first_name: validation::required(&form.firstname),
        last_name: validation::required(&form.lastname),
        email: validation::valid_email(&form.email),
        password: validation::valid_password(&form.password),
    };

    let values = SignupFormValues {
        first_name: form.firstname.clone(),
        last_name: form.lastname.clone(),
        email: form.email.clone(),
    };

    if !errors.is_empty() {
        return render_signup_page(&state, &session, values, errors).await;
    }

    match state
        .users()
        .insert(
            form.firstname.trim(),
            form.lastname.trim(),
            form.email.trim(),
            &form.password,
        )
        .await
    {
        Ok(user_id) => {
            info!(target: "auth", user_id, "account registered");
        }
        Err(RepoError::DuplicateEmail) => {
            let errors = SignupFieldErrors {
                email: Some(validation::MSG_DUPLICATE_EMAIL.to_string()),
                ..SignupFieldErrors::default()
            };
            return render_signup_page(&state, &session, values, errors).await;
        }
        Err(err) => {
            error!(target: "auth", %err, "failed to register account");
            return server_error_response();
        }
    }

    if let Err(err) = push_flash(&session, "Your signup was successful. Please log in.").await {
        error!(target: "sessions", %err, "failed to record flash message");
    }
    rotate_token(&session).await;

    Redirect::to("/user/login").into_response()
}

/// `GET /user/login` renders the empty login form.
pub async fn login_form_handler(State(state): State<AppState>, session: Session) -> Response {
    render_login_page(&state, &session, "", LoginFieldErrors::default()).await
}

/// `POST /user/login` checks credentials and establishes the session. A
/// failed attempt gets a small randomized delay and a deliberately vague
/// error message.
pub async fn login_submit_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(response) = check_csrf(&session, &form.csrf_token).await {
        warn!(target: "auth", "invalid CSRF token on login");
        return response;
    }

    // Only presence is checked here. A malformed email falls through to the
    // repository and earns the same generic message as a wrong password.
    let errors = LoginFieldErrors {
        email: validation::required(&form.email),
        password: validation::required(&form.password),
        generic: None,
    };

    if !errors.is_empty() {
        return render_login_page(&state, &session, &form.email, errors).await;
    }

    let user_id = match state
        .users()
        .authenticate(form.email.trim(), &form.password)
        .await
    {
        Ok(user_id) => user_id,
        Err(RepoError::Auth) => {
            randomized_backoff().await;
            let errors = LoginFieldErrors {
                generic: Some(validation::MSG_BAD_CREDENTIALS.to_string()),
                ..LoginFieldErrors::default()
            };
            return render_login_page(&state, &session, &form.email, errors).await;
        }
        Err(err) => {
            error!(target: "auth", %err, "failed to authenticate");
            return server_error_response();
        }
    };

    // Fresh session ID on privilege change.
    if let Err(err) = session.cycle_id().await {
        error!(target: "sessions", %err, "failed to cycle session id on login");
        return server_error_response();
    }

    let session_user = SessionUser::new(user_id, generate_logout_hash(user_id));
    if let Err(err) = store_user(&session, &session_user).await {
        error!(target: "sessions", %err, "failed to store session user");
        return server_error_response();
    }
    rotate_token(&session).await;

    info!(target: "auth", user_id, "login successful");

    Redirect::to("/").into_response()
}

/// `GET /user/logout?hash=…` ends the session when the confirmation hash
/// matches the one issued at login. A mismatch silently returns home so the
/// link cannot be used to probe sessions.
pub async fn logout_handler(
    session: Session,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<LogoutQuery>,
) -> Response {
    let hash_matches = query
        .hash
        .as_deref()
        .is_some_and(|hash| secure_compare(&auth_user.logout_hash, hash));

    if !hash_matches {
        warn!(
            target: "auth",
            user_id = auth_user.id,
            "logout confirmation hash mismatch"
        );
        return Redirect::to("/").into_response();
    }

    if let Err(err) = session.flush().await {
        error!(target: "sessions", %err, "failed to destroy session on logout");
        return server_error_response();
    }

    info!(target: "auth", user_id = auth_user.id, "logout successful");

    Redirect::to("/user/login").into_response()
}
