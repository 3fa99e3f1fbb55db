use std::sync::Arc;

use crate::{
    config::AppConfig,
    repository::{SnippetRepo, UserRepo},
};

/// Application state shared across all handlers. Repositories are injected
/// behind trait objects so tests can swap in the in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    users: UserRepo,
    snippets: SnippetRepo,
    config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(users: UserRepo, snippets: SnippetRepo, config: AppConfig) -> Self {
        Self {
            users,
            snippets,
            config: Arc::new(config),
        }
    }

    pub fn users(&self) -> &dyn crate::repository::UserRepository {
        self.users.as_ref()
    }

    pub fn snippets(&self) -> &dyn crate::repository::SnippetRepository {
        self.snippets.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
