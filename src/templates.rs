use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use time::OffsetDateTime;
use tracing::error;

use crate::app_state::AppState;

/// Shared layout context injected into all templates.
#[derive(Clone, Debug)]
pub struct LayoutContext {
    pub title: String,
    pub brand_name: String,
    pub user: Option<NavUser>,
    pub flashes: Vec<String>,
    pub current_year: i32,
}

/// The authenticated identity as the navigation bar sees it.
#[derive(Clone, Debug)]
pub struct NavUser {
    pub first_name: String,
    pub logout_hash: String,
}

impl LayoutContext {
    /// Build a layout context using the configured brand name.
    pub fn new(
        state: &AppState,
        title: impl Into<String>,
        user: Option<NavUser>,
        flashes: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            brand_name: state.config().ui.brand_name.clone(),
            user,
            flashes,
            current_year: OffsetDateTime::now_utc().year(),
        }
    }
}

/// Wrapper that converts Askama templates into Axum responses with logging.
pub struct HtmlTemplate<T: Template> {
    template: T,
    status: StatusCode,
}

impl<T: Template> HtmlTemplate<T> {
    pub fn new(template: T) -> Self {
        Self {
            template,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(template: T, status: StatusCode) -> Self {
        Self { template, status }
    }
}

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(err) => {
                error!(target: "templates", error = %err, "failed to render template");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Template rendering error",
                )
                    .into_response()
            }
        }
    }
}

/// One row of a snippet feed, preformatted for display.
#[derive(Clone, Debug)]
pub struct SnippetRow {
    pub id: i64,
    pub title: String,
    pub created_display: String,
    pub is_public: bool,
}

#[derive(Template)]
#[template(path = "snippet_list.html", escape = "html")]
pub struct SnippetListTemplate {
    pub layout: LayoutContext,
    pub heading: String,
    pub snippets: Vec<SnippetRow>,
    pub base_path: String,
    pub page: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl SnippetListTemplate {
    pub fn new(
        layout: LayoutContext,
        heading: impl Into<String>,
        snippets: Vec<SnippetRow>,
        base_path: impl Into<String>,
        page: u32,
        has_next: bool,
    ) -> Self {
        Self {
            layout,
            heading: heading.into(),
            snippets,
            base_path: base_path.into(),
            page,
            has_prev: page > 1,
            has_next,
        }
    }
}

/// A single snippet prepared for the detail page. `owner_hash` is only
/// populated for the owner and feeds the delete confirmation link.
#[derive(Clone, Debug)]
pub struct SnippetView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_display: String,
    pub expires_display: String,
    pub is_public: bool,
    pub owned: bool,
    pub owner_hash: String,
}

#[derive(Template)]
#[template(path = "snippet_show.html", escape = "html")]
pub struct SnippetShowTemplate {
    pub layout: LayoutContext,
    pub snippet: SnippetView,
}

impl SnippetShowTemplate {
    pub fn new(layout: LayoutContext, snippet: SnippetView) -> Self {
        Self { layout, snippet }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SnippetFormValues {
    pub title: String,
    pub content: String,
    pub expire: String,
    pub kind: String,
}

#[derive(Clone, Debug, Default)]
pub struct SnippetFieldErrors {
    pub title: Option<String>,
    pub content: Option<String>,
    pub expire: Option<String>,
    pub kind: Option<String>,
}

impl SnippetFieldErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.expire.is_none()
            && self.kind.is_none()
    }
}

#[derive(Template)]
#[template(path = "snippet_form.html", escape = "html")]
pub struct SnippetFormTemplate {
    pub layout: LayoutContext,
    pub heading: String,
    pub action: String,
    pub csrf_token: String,
    pub show_expire: bool,
    pub form: SnippetFormValues,
    pub errors: SnippetFieldErrors,
}

impl SnippetFormTemplate {
    pub fn new(
        layout: LayoutContext,
        heading: impl Into<String>,
        action: impl Into<String>,
        csrf_token: String,
        show_expire: bool,
        form: SnippetFormValues,
    ) -> Self {
        Self {
            layout,
            heading: heading.into(),
            action: action.into(),
            csrf_token,
            show_expire,
            form,
            errors: SnippetFieldErrors::default(),
        }
    }

    pub fn with_field_errors(mut self, errors: SnippetFieldErrors) -> Self {
        self.errors = errors;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct SignupFormValues {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Clone, Debug, Default)]
pub struct SignupFieldErrors {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SignupFieldErrors {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
    }
}

#[derive(Template)]
#[template(path = "signup.html", escape = "html")]
pub struct SignupTemplate {
    pub layout: LayoutContext,
    pub csrf_token: String,
    pub form: SignupFormValues,
    pub errors: SignupFieldErrors,
}

impl SignupTemplate {
    pub fn new(layout: LayoutContext, csrf_token: String) -> Self {
        Self {
            layout,
            csrf_token,
            form: SignupFormValues::default(),
            errors: SignupFieldErrors::default(),
        }
    }

    pub fn with_form(mut self, form: SignupFormValues) -> Self {
        self.form = form;
        self
    }

    pub fn with_field_errors(mut self, errors: SignupFieldErrors) -> Self {
        self.errors = errors;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoginFieldErrors {
    pub email: Option<String>,
    pub password: Option<String>,
    pub generic: Option<String>,
}

impl LoginFieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.generic.is_none()
    }
}

#[derive(Template)]
#[template(path = "login.html", escape = "html")]
pub struct LoginTemplate {
    pub layout: LayoutContext,
    pub csrf_token: String,
    pub email: String,
    pub errors: LoginFieldErrors,
}

impl LoginTemplate {
    pub fn new(layout: LayoutContext, csrf_token: String) -> Self {
        Self {
            layout,
            csrf_token,
            email: String::new(),
            errors: LoginFieldErrors::default(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_field_errors(mut self, errors: LoginFieldErrors) -> Self {
        self.errors = errors;
        self
    }
}
