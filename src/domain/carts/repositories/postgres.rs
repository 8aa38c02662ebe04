//! Postgres cart store.
//!
//! Carts persist as one `carts` row plus its `cart_items` rows. A save
//! replaces the whole set inside a transaction, mirroring the
//! document-replace semantics the service layer assumes: the cart row is
//! inserted (version 1) or updated under a version check, the old item rows
//! are deleted, and the current items are written back in order.

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::carts::{
        models::{Cart, CartItem},
        repositories::CartStore,
    },
    ids::{CartUuid, OwnerUuid, ProductUuid},
    storage::StorageError,
};

const FIND_CART_SQL: &str = include_str!("../sql/find_cart.sql");
const FIND_CART_ITEMS_SQL: &str = include_str!("../sql/find_cart_items.sql");
const INSERT_CART_SQL: &str = include_str!("../sql/insert_cart.sql");
const UPDATE_CART_SQL: &str = include_str!("../sql/update_cart.sql");
const DELETE_CART_ITEMS_SQL: &str = include_str!("../sql/delete_cart_items.sql");
const INSERT_CART_ITEM_SQL: &str = include_str!("../sql/insert_cart_item.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgCartStore {
    db: Db,
}

impl PgCartStore {
    #[must_use]
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }

    async fn replace_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart_uuid: CartUuid,
        items: &[CartItem],
    ) -> Result<(), sqlx::Error> {
        query(DELETE_CART_ITEMS_SQL)
            .bind(cart_uuid.into_uuid())
            .execute(&mut **tx)
            .await?;

        for (position, item) in items.iter().enumerate() {
            let position = i64::try_from(position).map_err(|e| sqlx::Error::ColumnDecode {
                index: "position".to_string(),
                source: Box::new(e),
            })?;

            query(INSERT_CART_ITEM_SQL)
                .bind(cart_uuid.into_uuid())
                .bind(item.product.into_uuid())
                .bind(position)
                .bind(i64::from(item.quantity))
                .bind(to_db_amount(item.unit_price, "unit_price")?)
                .bind(to_db_amount(item.line_total, "line_total")?)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_cart(&self, owner: OwnerUuid) -> Result<Option<Cart>, StorageError> {
        let pool = self.db.pool();

        let Some(mut cart) = query_as::<Postgres, Cart>(FIND_CART_SQL)
            .bind(owner.into_uuid())
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let items = query_as::<Postgres, CartItem>(FIND_CART_ITEMS_SQL)
            .bind(cart.uuid.into_uuid())
            .fetch_all(pool)
            .await?;

        cart.items = items;

        Ok(Some(cart))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart, StorageError> {
        let mut tx = self.db.begin().await?;

        let subtotal = to_db_amount(cart.subtotal, "subtotal")?;
        let total = to_db_amount(cart.total, "total")?;

        let (cart_uuid, created_at, updated_at) = if cart.version == 0 {
            let row: Option<(SqlxTimestamp, SqlxTimestamp)> = query_as(INSERT_CART_SQL)
                .bind(cart.uuid.into_uuid())
                .bind(cart.owner.into_uuid())
                .bind(subtotal)
                .bind(total)
                .fetch_optional(&mut *tx)
                .await?;

            // A cart document already exists for this owner: the caller read
            // stale (absent) state and must re-read.
            let Some((created_at, updated_at)) = row else {
                return Err(StorageError::Conflict);
            };

            (cart.uuid, created_at, updated_at)
        } else {
            let version = to_db_amount(cart.version, "version")?;

            let row: Option<(Uuid, SqlxTimestamp, SqlxTimestamp)> = query_as(UPDATE_CART_SQL)
                .bind(cart.owner.into_uuid())
                .bind(subtotal)
                .bind(total)
                .bind(version)
                .fetch_optional(&mut *tx)
                .await?;

            let Some((uuid, created_at, updated_at)) = row else {
                return Err(StorageError::Conflict);
            };

            (CartUuid::from_uuid(uuid), created_at, updated_at)
        };

        self.replace_items(&mut tx, cart_uuid, &cart.items).await?;

        tx.commit().await?;

        Ok(Cart {
            uuid: cart_uuid,
            owner: cart.owner,
            items: cart.items.clone(),
            subtotal: cart.subtotal,
            total: cart.total,
            version: cart.version + 1,
            created_at: created_at.to_jiff(),
            updated_at: updated_at.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Cart {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            owner: OwnerUuid::from_uuid(row.try_get("owner_uuid")?),
            items: Vec::new(),
            subtotal: try_get_unsigned(row, "subtotal")?,
            total: try_get_unsigned(row, "total")?,
            version: try_get_unsigned(row, "version")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let quantity_i64: i64 = row.try_get("quantity")?;

        let quantity = u32::try_from(quantity_i64).map_err(|e| sqlx::Error::ColumnDecode {
            index: "quantity".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity,
            unit_price: try_get_unsigned(row, "unit_price")?,
            line_total: try_get_unsigned(row, "line_total")?,
        })
    }
}

fn try_get_unsigned(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let value_i64: i64 = row.try_get(col)?;

    u64::try_from(value_i64).map_err(|e| sqlx::Error::ColumnDecode {
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
