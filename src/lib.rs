pub mod app_state;
pub mod auth;
pub mod config;
pub mod csrf;
pub mod database;
pub mod logging;
pub mod models;
pub mod repository;
pub mod server;
pub mod sessions;
pub mod store;
pub mod templates;
pub mod validation;

pub use app_state::AppState;
pub use config::AppConfig;
pub use server::build_router;
