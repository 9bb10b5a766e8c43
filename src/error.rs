use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load resource '{path}': {message}")]
    Resource { path: String, message: String },

    #[error("Document store error: {message}")]
    Store { message: String },

    #[error("Checkpoint error: {message}")]
    Checkpoint { message: String },
}

impl PrepError {
    pub fn resource(path: impl Into<String>, message: impl Into<String>) -> Self {
        PrepError::Resource {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        PrepError::Store {
            message: message.into(),
        }
    }

    pub fn checkpoint(message: impl Into<String>) -> Self {
        PrepError::Checkpoint {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
