//! Postgres products repository.

use std::str::FromStr;

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};

use crate::{
    database::Db,
    domain::catalog::{
        models::{Category, NewProduct, Product, ProductSnapshot, ProductUpdate, StockUnit},
        repositories::{CatalogStore, ProductsRepository},
    },
    ids::ProductUuid,
    storage::StorageError,
};

const LIST_PRODUCTS_SQL: &str = include_str!("../sql/list_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("../sql/get_product.sql");
const RESOLVE_PRODUCT_SQL: &str = include_str!("../sql/resolve_product.sql");
const INSERT_PRODUCT_SQL: &str = include_str!("../sql/insert_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("../sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("../sql/delete_product.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgProductsRepository {
    db: Db,
}

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductsRepository for PgProductsRepository {
    async fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        let products = query_as::<Postgres, Product>(LIST_PRODUCTS_SQL)
            .fetch_all(self.db.pool())
            .await?;

        Ok(products)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<Option<Product>, StorageError> {
        let product = query_as::<Postgres, Product>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StorageError> {
        let created = query_as::<Postgres, Product>(INSERT_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(&product.name)
            .bind(product.category.as_str())
            .bind(&product.brand)
            .bind(product.unit.as_str())
            .bind(to_db_amount(product.price, "price")?)
            .bind(to_db_amount(product.stock, "stock")?)
            .bind(&product.description)
            .fetch_one(self.db.pool())
            .await?;

        Ok(created)
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Option<Product>, StorageError> {
        let updated = query_as::<Postgres, Product>(UPDATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(&update.name)
            .bind(update.category.as_str())
            .bind(&update.brand)
            .bind(update.unit.as_str())
            .bind(to_db_amount(update.price, "price")?)
            .bind(to_db_amount(update.stock, "stock")?)
            .bind(&update.description)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(updated)
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<u64, StorageError> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

#[async_trait]
impl CatalogStore for PgProductsRepository {
    async fn resolve_product(
        &self,
        product: ProductUuid,
    ) -> Result<Option<ProductSnapshot>, StorageError> {
        let row: Option<(i64, i64)> = query_as(RESOLVE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        let Some((price, stock)) = row else {
            return Ok(None);
        };

        Ok(Some(ProductSnapshot {
            price: from_db_amount(price, "price")?,
            stock: from_db_amount(stock, "stock")?,
        }))
    }
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let category: String = row.try_get("category")?;
        let unit: String = row.try_get("unit")?;

        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            category: Category::from_str(&category).map_err(|e| sqlx::Error::ColumnDecode {
                index: "category".to_string(),
                source: Box::new(e),
            })?,
            brand: row.try_get("brand")?,
            unit: StockUnit::from_str(&unit).map_err(|e| sqlx::Error::ColumnDecode {
                index: "unit".to_string(),
                source: Box::new(e),
            })?,
            price: try_get_unsigned(row, "price")?,
            stock: try_get_unsigned(row, "stock")?,
            description: row.try_get("description")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

fn try_get_unsigned(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    from_db_amount(row.try_get(col)?, col)
}

fn from_db_amount(value: i64, col: &str) -> Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

fn to_db_amount(value: u64, col: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}
