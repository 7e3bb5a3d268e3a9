//! Error types for Trendcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrendcastError>;

#[derive(Error, Debug)]
pub enum TrendcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TrendcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TrendcastError::InvalidInput(_) => 3,
            TrendcastError::Platform(PlatformError::Authentication(_)) => 2,
            TrendcastError::Platform(_) => 1,
            TrendcastError::Config(_) => 1,
            TrendcastError::Database(_) => 1,
            TrendcastError::Media(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Schema migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Plan item ({user_id}, {item_id}) already exists")]
    DuplicateItem { user_id: i64, item_id: i64 },

    #[error("Plan item ({user_id}, {item_id}) not found")]
    ItemNotFound { user_id: i64, item_id: i64 },
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),
}
