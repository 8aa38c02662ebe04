//! Products service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::{
    domain::catalog::{
        errors::ProductsServiceError,
        models::{NewProduct, Product, ProductUpdate, validate_product_fields},
        repositories::ProductsRepository,
    },
    ids::ProductUuid,
};

/// Catalog service over an injected repository.
#[derive(Clone)]
pub struct ProductService {
    repository: Arc<dyn ProductsRepository>,
}

impl ProductService {
    #[must_use]
    pub fn new(repository: Arc<dyn ProductsRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ProductsService for ProductService {
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError> {
        let products = self.repository.list_products().await?;

        Ok(products)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        self.repository
            .get_product(product)
            .await?
            .ok_or(ProductsServiceError::NotFound)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError> {
        validate_product_fields(&product.name, &product.brand, product.price)?;

        let created = self.repository.insert_product(product).await?;

        Ok(created)
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError> {
        validate_product_fields(&update.name, &update.brand, update.price)?;

        self.repository
            .update_product(product, update)
            .await?
            .ok_or(ProductsServiceError::NotFound)
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError> {
        let rows_affected = self.repository.delete_product(product).await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound);
        }

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieves all live products.
    async fn list_products(&self) -> Result<Vec<Product>, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Creates a new product after validating its fields.
    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError>;

    /// Replaces a product's fields after validating them.
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError>;

    /// Soft-deletes a product. Deleted products stop resolving for carts.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError>;
}
