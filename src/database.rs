use std::str::FromStr;

use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),
}

/// Initialize the SQLite connection pool with WAL mode and a busy timeout.
pub async fn create_pool(config: &AppConfig) -> Result<SqlitePool, DatabaseError> {
    info!("Initializing database connection pool");

    let mut connect_options = SqliteConnectOptions::from_str(&config.database.url)
        .map_err(|e| DatabaseError::InvalidUrl(format!("Invalid database URL: {}", e)))?;

    connect_options = connect_options
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(5))
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(connect_options).await?;

    info!(
        "Database connection pool created with max connections: {}",
        config.database.max_connections
    );

    Ok(pool)
}

/// Create the connection pool and the application tables. The session table
/// is owned by the session store and migrated separately.
pub async fn initialize_database(config: &AppConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(config).await?;

    create_tables(&pool).await?;

    info!("Database initialization completed successfully");

    Ok(pool)
}

/// Create the `users` and `snippets` tables and their indices.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), DatabaseError> {
    info!("Creating database tables");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snippets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            owner_id INTEGER NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (owner_id) REFERENCES users(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_snippets_owner_id ON snippets(owner_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_snippets_expires_at ON snippets(expires_at)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_snippets_created_at ON snippets(created_at DESC)",
    )
    .execute(pool)
    .await?;

    info!("Database tables created successfully");

    Ok(())
}
