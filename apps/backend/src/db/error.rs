//! Database error types.

use sentences_core::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DbError> for PersistenceError {
    fn from(e: DbError) -> Self {
        PersistenceError::Storage(e.to_string())
    }
}
