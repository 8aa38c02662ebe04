//! Catalog persistence boundary.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    domain::catalog::models::{NewProduct, Product, ProductSnapshot, ProductUpdate},
    ids::ProductUuid,
    storage::StorageError,
};

mod postgres;

pub(crate) use postgres::PgProductsRepository;

/// Full catalog access used by the products service.
///
/// Deletes are soft: deleted products stay on record but stop being listed,
/// fetched or resolved.
#[automock]
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    /// All live products, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>, StorageError>;

    /// A single live product.
    async fn get_product(&self, product: ProductUuid) -> Result<Option<Product>, StorageError>;

    /// Insert a new product, stamping its timestamps.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StorageError>;

    /// Replace a live product's fields. Returns `None` when absent.
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Option<Product>, StorageError>;

    /// Soft-delete a product, returning the number of rows affected.
    async fn delete_product(&self, product: ProductUuid) -> Result<u64, StorageError>;
}

/// The catalog as the cart engine sees it: a read-only resolver from product
/// reference to current price and stock. Soft-deleted products do not
/// resolve, which is what lets the cart repair path notice dangling
/// references.
#[automock]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Resolve a product reference to its current price and stock.
    async fn resolve_product(
        &self,
        product: ProductUuid,
    ) -> Result<Option<ProductSnapshot>, StorageError>;
}
