//! Cart persistence boundary.

use async_trait::async_trait;
use mockall::automock;

use crate::{domain::carts::models::Cart, ids::OwnerUuid, storage::StorageError};

mod postgres;

pub(crate) use postgres::PgCartStore;

/// Store holding one cart document per owner.
///
/// Saves replace the whole document and are guarded by its version: the
/// store only applies a save whose version matches the stored one (or an
/// insert of a version-zero document when none exists) and bumps the version
/// on success. A mismatch fails with [`StorageError::Conflict`] and the
/// caller re-reads and retries. The store is the only serialization point
/// between concurrent mutations of the same cart.
#[automock]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load the cart owned by `owner`, if one has been persisted.
    async fn find_cart(&self, owner: OwnerUuid) -> Result<Option<Cart>, StorageError>;

    /// Replace the stored cart document, returning the persisted form with
    /// its version bumped.
    async fn save_cart(&self, cart: &Cart) -> Result<Cart, StorageError>;
}
