//! Backend-neutral storage boundary.
//!
//! Repository traits speak in terms of [`StorageError`] so services stay
//! independent of the backend behind them. The Postgres implementations map
//! driver errors into these variants; the in-memory test stores construct
//! them directly.

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

/// Failures surfaced by a repository backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The document was replaced by another writer since it was read.
    #[error("document version conflict")]
    Conflict,

    /// A document with the same key already exists.
    #[error("duplicate document")]
    Duplicate,

    /// The backend failed, or returned data that could not be decoded.
    #[error("storage backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::Duplicate,
            _ => Self::Backend(Box::new(error)),
        }
    }
}
