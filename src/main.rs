use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use time::Duration;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::info;

use snipbin::{
    app_state::AppState,
    config::{self, AppConfig},
    database::{self, initialize_database},
    logging::init_logging,
    server::build_router,
    store::{SqliteSnippetStore, SqliteUserStore},
};

#[derive(Debug, Error)]
enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database initialization error: {0}")]
    DatabaseInit(#[from] database::DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Logging error: {0}")]
    Logging(String),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging().map_err(|e| AppError::Logging(e.to_string()))?;
    info!("Starting Snipbin");

    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    let db_pool = initialize_database(&config).await?;

    let session_store = SqliteStore::new(db_pool.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.security.cookie_secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_name(config.session.cookie_name.clone())
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session.max_age_hours as i64,
        )));

    let pepper = config.security.password_pepper.clone();
    let users = Arc::new(SqliteUserStore::new(db_pool.clone(), pepper));
    let snippets = Arc::new(SqliteSnippetStore::new(db_pool));
    let app_state = AppState::new(users, snippets, config.clone());

    let app = build_router(app_state, session_layer);

    let addr = SocketAddr::new(config.server.bind_addr.parse()?, config.server.port);
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
