//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartService, CartsService, repositories::PgCartStore},
        catalog::{ProductService, ProductsService, repositories::PgProductsRepository},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

/// Wired-up service handles. Construction is the single place backends are
/// chosen; everything downstream works against the service traits.
#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);
        let catalog = Arc::new(PgProductsRepository::new(db.clone()));
        let cart_store = Arc::new(PgCartStore::new(db));

        Ok(Self {
            products: Arc::new(ProductService::new(catalog.clone())),
            carts: Arc::new(CartService::new(cart_store, catalog)),
        })
    }
}
