use config::{Config, ConfigError as BaseConfigError, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct SecurityConfig {
    pub cookie_secure: bool,
    pub password_pepper: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub max_age_hours: u64,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct PaginationConfig {
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct UiConfig {
    pub brand_name: String,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub session: SessionConfig,
    pub pagination: PaginationConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] BaseConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config.*` file, and
    /// environment variable overrides, in that order.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut settings = Config::builder();

        settings = settings.add_source(config::Config::try_from(&AppConfig::default())?);
        settings = settings.add_source(File::with_name("config").required(false));

        settings = settings
            .set_override(
                "server.bind_addr",
                std::env::var("SERVER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            )?
            .set_override(
                "server.port",
                std::env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse::<u16>()
                    .unwrap_or(8080),
            )?
            .set_override(
                "database.url",
                std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/snipbin.db?mode=rwc".to_string()),
            )?
            .set_override(
                "database.max_connections",
                std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse::<u32>()
                    .unwrap_or(10),
            )?
            .set_override(
                "security.cookie_secure",
                std::env::var("COOKIE_SECURE")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse::<bool>()
                    .unwrap_or(false),
            )?
            .set_override(
                "session.cookie_name",
                std::env::var("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|_| "snipbin_session".to_string()),
            )?
            .set_override(
                "session.max_age_hours",
                std::env::var("SESSION_MAX_AGE_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse::<u64>()
                    .unwrap_or(24),
            )?
            .set_override(
                "pagination.page_size",
                std::env::var("PAGE_SIZE")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse::<u32>()
                    .unwrap_or(10),
            )?
            .set_override(
                "ui.brand_name",
                std::env::var("UI_BRAND_NAME").unwrap_or_else(|_| "Snipbin".to_string()),
            )?;

        if let Ok(pepper) = std::env::var("PASSWORD_PEPPER") {
            settings = settings.set_override("security.password_pepper", pepper)?;
        }

        let settings = settings.build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.pagination.page_size == 0 {
            return Err(ConfigError::Validation(
                "PAGE_SIZE must be at least 1".to_string(),
            ));
        }

        if self.session.max_age_hours == 0 {
            return Err(ConfigError::Validation(
                "SESSION_MAX_AGE_HOURS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://data/snipbin.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            security: SecurityConfig {
                cookie_secure: false,
                password_pepper: None,
            },
            session: SessionConfig {
                cookie_name: "snipbin_session".to_string(),
                max_age_hours: 24,
            },
            pagination: PaginationConfig { page_size: 10 },
            ui: UiConfig {
                brand_name: "Snipbin".to_string(),
            },
        }
    }
}
