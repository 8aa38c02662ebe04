//! Carts service errors.

use thiserror::Error;

use crate::{domain::carts::models::AmountOverflow, storage::StorageError};

/// Failures surfaced by cart operations.
///
/// Every variant carries enough context for a caller to render a user-facing
/// message. None of these are retried internally except bounded retries on
/// version conflicts; a leaked conflict becomes
/// [`ConcurrentModification`](Self::ConcurrentModification).
#[derive(Debug, Error)]
pub enum CartsServiceError {
    /// Requested quantity was below the minimum of one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// No cart document exists for the owner.
    #[error("cart not found")]
    CartNotFound,

    /// The cart exists but holds no line item for the product.
    #[error("item not found in cart")]
    ItemNotFound,

    /// The referenced product does not resolve against the catalog.
    #[error("product not found")]
    ProductNotFound,

    /// Requested quantity exceeds the product's current stock.
    #[error("only {available} units available")]
    InsufficientStock {
        /// Stock level at the time of the check.
        available: u64,
    },

    /// The cart kept changing under concurrent writers; the request was
    /// abandoned after bounded retries.
    #[error("cart was modified concurrently; retry the request")]
    ConcurrentModification,

    /// A derived amount left the representable range.
    #[error(transparent)]
    AmountOverflow(#[from] AmountOverflow),

    /// Underlying storage error, reported as-is.
    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for CartsServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Conflict | StorageError::Duplicate => Self::ConcurrentModification,
            other => Self::Storage(other),
        }
    }
}
