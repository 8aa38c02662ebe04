//! Products service errors.

use thiserror::Error;

use crate::{domain::catalog::models::ProductValidationError, storage::StorageError};

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error(transparent)]
    Invalid(#[from] ProductValidationError),

    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for ProductsServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Duplicate => Self::AlreadyExists,
            other => Self::Storage(other),
        }
    }
}
