//! Repository Module
//!
//! CRUD operations on the SQLite tables, plus the [`SpotStore`] interface
//! the concurrency and search layers are written against.

pub mod spot;

#[cfg(test)]
pub mod memory;

pub use spot::{SpotStore, SqliteSpotStore};

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
