use thiserror::Error;

use crate::models::LocalId;

/// Errors raised by the catalog engine and its SQLite store.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage conflict on anime {local_id}: {reason}")]
    StorageConflict { local_id: LocalId, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
