//! Carts service.
//!
//! The sole authorized mutator of cart documents. Every operation is a
//! read-modify-write against the injected [`CartStore`], with product price
//! and stock read through the injected [`CatalogStore`]. Version conflicts
//! between concurrent writers are absorbed by re-reading and retrying a
//! bounded number of times.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::{
    domain::{
        carts::{errors::CartsServiceError, models::Cart, repositories::CartStore},
        catalog::repositories::CatalogStore,
    },
    ids::{OwnerUuid, ProductUuid},
    storage::StorageError,
};

/// How many times a mutation re-reads and retries after a version conflict
/// before giving up with [`CartsServiceError::ConcurrentModification`].
const MAX_SAVE_ATTEMPTS: u32 = 3;

/// Cart mutation engine over injected stores.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl CartService {
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { store, catalog }
    }

    /// Resolve every product referenced by the cart, collecting the ones the
    /// catalog still knows about.
    async fn resolve_known_products(
        &self,
        cart: &Cart,
    ) -> Result<FxHashSet<ProductUuid>, CartsServiceError> {
        let mut known = FxHashSet::default();

        for item in &cart.items {
            if known.contains(&item.product) {
                continue;
            }

            if self.catalog.resolve_product(item.product).await?.is_some() {
                known.insert(item.product);
            }
        }

        Ok(known)
    }
}

#[async_trait]
impl CartsService for CartService {
    #[tracing::instrument(name = "carts.service.get_cart", skip(self), fields(owner_uuid = %owner), err)]
    async fn get_cart(&self, owner: OwnerUuid) -> Result<Cart, CartsServiceError> {
        let Some(mut cart) = self.store.find_cart(owner).await? else {
            // No document yet: synthesize an empty view without persisting.
            return Ok(Cart::new(owner));
        };

        let known = self.resolve_known_products(&cart).await?;
        let report = cart.repair(&known)?;

        if !report.changed {
            return Ok(cart);
        }

        debug!(dropped = report.dropped, "repaired drifted cart");

        match self.store.save_cart(&cart).await {
            Ok(saved) => Ok(saved),
            // Another writer got there first; serve the repaired view and
            // leave persistence to the next read.
            Err(StorageError::Conflict) => Ok(cart),
            Err(error) => Err(error.into()),
        }
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self),
        fields(owner_uuid = %owner, product_uuid = %product, quantity),
        err
    )]
    async fn add_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let snapshot = self
            .catalog
            .resolve_product(product)
            .await?
            .ok_or(CartsServiceError::ProductNotFound)?;

        // Checked against current stock only, not against what the cart
        // already holds; repeated small adds may exceed real stock.
        if snapshot.stock < u64::from(quantity) {
            return Err(CartsServiceError::InsufficientStock {
                available: snapshot.stock,
            });
        }

        let mut attempts = 0;

        loop {
            let mut cart = self
                .store
                .find_cart(owner)
                .await?
                .unwrap_or_else(|| Cart::new(owner));

            cart.merge_item(product, quantity, snapshot.price)?;

            match self.store.save_cart(&cart).await {
                Ok(saved) => {
                    info!(cart_uuid = %saved.uuid, "added item to cart");

                    return Ok(saved);
                }
                Err(StorageError::Conflict | StorageError::Duplicate) => {
                    attempts += 1;

                    if attempts >= MAX_SAVE_ATTEMPTS {
                        return Err(CartsServiceError::ConcurrentModification);
                    }

                    debug!(attempts, "cart version conflict, retrying");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    #[tracing::instrument(
        name = "carts.service.update_item_quantity",
        skip(self),
        fields(owner_uuid = %owner, product_uuid = %product, quantity),
        err
    )]
    async fn update_item_quantity(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        let mut attempts = 0;

        loop {
            let mut cart = self
                .store
                .find_cart(owner)
                .await?
                .ok_or(CartsServiceError::CartNotFound)?;

            if cart.find_item(product).is_none() {
                return Err(CartsServiceError::ItemNotFound);
            }

            if quantity == 0 {
                // Zero means removal; a zero-quantity row is never stored.
                cart.remove_item(product)?;
            } else {
                cart.set_item_quantity(product, quantity)?;
            }

            match self.store.save_cart(&cart).await {
                Ok(saved) => {
                    info!(cart_uuid = %saved.uuid, "updated item quantity");

                    return Ok(saved);
                }
                Err(StorageError::Conflict | StorageError::Duplicate) => {
                    attempts += 1;

                    if attempts >= MAX_SAVE_ATTEMPTS {
                        return Err(CartsServiceError::ConcurrentModification);
                    }

                    debug!(attempts, "cart version conflict, retrying");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self),
        fields(owner_uuid = %owner, product_uuid = %product),
        err
    )]
    async fn remove_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
    ) -> Result<Cart, CartsServiceError> {
        let mut attempts = 0;

        loop {
            let Some(mut cart) = self.store.find_cart(owner).await? else {
                // Nothing to remove from; absence is not an error here.
                return Ok(Cart::new(owner));
            };

            if !cart.remove_item(product)? {
                return Ok(cart);
            }

            match self.store.save_cart(&cart).await {
                Ok(saved) => {
                    info!(cart_uuid = %saved.uuid, "removed item from cart");

                    return Ok(saved);
                }
                Err(StorageError::Conflict | StorageError::Duplicate) => {
                    attempts += 1;

                    if attempts >= MAX_SAVE_ATTEMPTS {
                        return Err(CartsServiceError::ConcurrentModification);
                    }

                    debug!(attempts, "cart version conflict, retrying");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    #[tracing::instrument(name = "carts.service.clear_cart", skip(self), fields(owner_uuid = %owner), err)]
    async fn clear_cart(&self, owner: OwnerUuid) -> Result<Cart, CartsServiceError> {
        let mut attempts = 0;

        loop {
            let mut cart = self
                .store
                .find_cart(owner)
                .await?
                .ok_or(CartsServiceError::CartNotFound)?;

            cart.clear();

            match self.store.save_cart(&cart).await {
                Ok(saved) => {
                    info!(cart_uuid = %saved.uuid, "cleared cart");

                    return Ok(saved);
                }
                Err(StorageError::Conflict | StorageError::Duplicate) => {
                    attempts += 1;

                    if attempts >= MAX_SAVE_ATTEMPTS {
                        return Err(CartsServiceError::ConcurrentModification);
                    }

                    debug!(attempts, "cart version conflict, retrying");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the owner's cart, repairing any drift before returning it.
    /// Owners without a persisted cart get an empty view.
    async fn get_cart(&self, owner: OwnerUuid) -> Result<Cart, CartsServiceError>;

    /// Add `quantity` of a product, merging with an existing line item and
    /// snapshotting the unit price on first add.
    async fn add_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Set an existing line item's quantity; zero removes the item.
    async fn update_item_quantity(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Remove a line item. Absence of the item (or the cart) is not an
    /// error.
    async fn remove_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
    ) -> Result<Cart, CartsServiceError>;

    /// Empty the owner's cart. The document survives with zero items.
    async fn clear_cart(&self, owner: OwnerUuid) -> Result<Cart, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::{models::CartItem, repositories::MockCartStore},
            catalog::{
                models::ProductSnapshot,
                repositories::MockCatalogStore,
                service::ProductsService,
            },
        },
        test::{TestContext, helpers::seed_product},
    };

    use super::*;

    #[tokio::test]
    async fn get_cart_for_new_owner_returns_empty_view_without_persisting() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        let cart = ctx.carts.get_cart(owner).await?;

        assert!(cart.items.is_empty());
        assert_eq!(cart.subtotal, 0);
        assert_eq!(cart.version, 0, "view must not look persisted");
        assert_eq!(ctx.cart_store.cart_count(), 0, "nothing may be written");

        Ok(())
    }

    #[tokio::test]
    async fn add_item_snapshots_price_and_derives_totals() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 10_00, 5).await?;

        let cart = ctx.carts.add_item(owner, product, 2).await?;

        assert_eq!(cart.items.len(), 1);

        let item = cart.find_item(product).expect("item should exist");

        assert_eq!(item.quantity, 2);
        assert_eq!(item.unit_price, 10_00);
        assert_eq!(item.line_total, 20_00);
        assert_eq!(cart.subtotal, 20_00);
        assert_eq!(cart.version, 1);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_same_product_merges_into_one_line() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 10_00, 5).await?;

        ctx.carts.add_item(owner, product, 2).await?;
        let cart = ctx.carts.add_item(owner, product, 3).await?;

        assert_eq!(cart.items.len(), 1, "duplicate product must merge");

        let item = cart.find_item(product).expect("item should exist");

        assert_eq!(item.quantity, 5);
        assert_eq!(item.unit_price, 10_00);
        assert_eq!(item.line_total, 50_00);
        assert_eq!(cart.subtotal, 50_00);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_insufficient_stock_leaves_cart_unchanged() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 10_00, 5).await?;
        let scarce = seed_product(&ctx, 2_00, 5).await?;

        ctx.carts.add_item(owner, product, 5).await?;

        let result = ctx.carts.add_item(owner, scarce, 100).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::InsufficientStock { available: 5 })
            ),
            "expected InsufficientStock, got {result:?}"
        );

        let cart = ctx.carts.get_cart(owner).await?;

        assert_eq!(cart.items.len(), 1, "failed add must not change the cart");
        assert_eq!(cart.subtotal, 50_00);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_unknown_product_returns_product_not_found() {
        let ctx = TestContext::new();

        let result = ctx
            .carts
            .add_item(OwnerUuid::new(), ProductUuid::new(), 1)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::ProductNotFound)),
            "expected ProductNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn add_item_zero_quantity_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let product = seed_product(&ctx, 10_00, 5).await?;

        let result = ctx.carts.add_item(OwnerUuid::new(), product, 0).await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_keeps_price_snapshot_across_catalog_change() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 10_00, 50).await?;

        ctx.carts.add_item(owner, product, 1).await?;

        // Reprice the product in the catalog between the two adds.
        let stored = ctx.products.get_product(product).await?;
        ctx.products
            .update_product(
                product,
                crate::domain::catalog::models::ProductUpdate {
                    name: stored.name,
                    category: stored.category,
                    brand: stored.brand,
                    unit: stored.unit,
                    price: 99_99,
                    stock: stored.stock,
                    description: stored.description,
                },
            )
            .await?;

        let cart = ctx.carts.add_item(owner, product, 1).await?;
        let item = cart.find_item(product).expect("item should exist");

        assert_eq!(item.quantity, 2);
        assert_eq!(item.unit_price, 10_00, "price snapshot must be kept");
        assert_eq!(cart.subtotal, 20_00);

        Ok(())
    }

    #[tokio::test]
    async fn repeated_adds_may_exceed_stock_cumulatively() -> TestResult {
        // The stock check compares each request against current stock, not
        // against stock minus what the cart already holds. Documented
        // behaviour, not an accident.
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 1_00, 5).await?;

        ctx.carts.add_item(owner, product, 3).await?;
        let cart = ctx.carts.add_item(owner, product, 3).await?;

        let item = cart.find_item(product).expect("item should exist");

        assert_eq!(item.quantity, 6, "cumulative adds are not capped by stock");

        Ok(())
    }

    #[tokio::test]
    async fn update_item_quantity_keeps_price_snapshot() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 10_00, 50).await?;

        ctx.carts.add_item(owner, product, 2).await?;

        let cart = ctx.carts.update_item_quantity(owner, product, 7).await?;
        let item = cart.find_item(product).expect("item should exist");

        assert_eq!(item.quantity, 7);
        assert_eq!(item.unit_price, 10_00);
        assert_eq!(item.line_total, 70_00);
        assert_eq!(cart.subtotal, 70_00);

        Ok(())
    }

    #[tokio::test]
    async fn update_item_quantity_zero_removes_the_item() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let kept = seed_product(&ctx, 3_00, 50).await?;
        let dropped = seed_product(&ctx, 10_00, 50).await?;

        ctx.carts.add_item(owner, kept, 1).await?;
        ctx.carts.add_item(owner, dropped, 2).await?;

        let cart = ctx.carts.update_item_quantity(owner, dropped, 0).await?;

        assert!(cart.find_item(dropped).is_none(), "zero quantity removes");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.subtotal, 3_00);

        Ok(())
    }

    #[tokio::test]
    async fn update_item_quantity_without_cart_returns_cart_not_found() {
        let ctx = TestContext::new();

        let result = ctx
            .carts
            .update_item_quantity(OwnerUuid::new(), ProductUuid::new(), 1)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::CartNotFound)),
            "expected CartNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn update_item_quantity_without_item_returns_item_not_found() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 10_00, 5).await?;

        ctx.carts.add_item(owner, product, 1).await?;

        let result = ctx
            .carts
            .update_item_quantity(owner, ProductUuid::new(), 1)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::ItemNotFound)),
            "expected ItemNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_is_idempotent() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 10_00, 5).await?;
        let other = seed_product(&ctx, 2_50, 5).await?;

        ctx.carts.add_item(owner, product, 1).await?;
        ctx.carts.add_item(owner, other, 2).await?;

        let cart = ctx.carts.remove_item(owner, product).await?;

        assert!(cart.find_item(product).is_none());
        assert_eq!(cart.subtotal, 5_00);

        let version_after_removal = ctx.cart_store.stored_version(owner);

        let cart = ctx.carts.remove_item(owner, product).await?;

        assert_eq!(cart.subtotal, 5_00, "second removal changes nothing");
        assert_eq!(
            ctx.cart_store.stored_version(owner),
            version_after_removal,
            "a no-op removal must not write"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_without_cart_returns_empty_view() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();

        let cart = ctx.carts.remove_item(owner, ProductUuid::new()).await?;

        assert!(cart.items.is_empty());
        assert_eq!(ctx.cart_store.cart_count(), 0, "nothing may be written");

        Ok(())
    }

    #[tokio::test]
    async fn clear_cart_empties_and_is_idempotent() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let product = seed_product(&ctx, 10_00, 5).await?;

        ctx.carts.add_item(owner, product, 2).await?;

        let first = ctx.carts.clear_cart(owner).await?;

        assert!(first.items.is_empty());
        assert_eq!(first.subtotal, 0);

        let second = ctx.carts.clear_cart(owner).await?;

        assert!(second.items.is_empty());
        assert_eq!(second.subtotal, 0);

        Ok(())
    }

    #[tokio::test]
    async fn clear_cart_without_cart_returns_cart_not_found() {
        let ctx = TestContext::new();

        let result = ctx.carts.clear_cart(OwnerUuid::new()).await;

        assert!(
            matches!(result, Err(CartsServiceError::CartNotFound)),
            "expected CartNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn get_cart_drops_items_for_deleted_products_and_persists() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let kept = seed_product(&ctx, 3_00, 50).await?;
        let doomed = seed_product(&ctx, 10_00, 50).await?;

        ctx.carts.add_item(owner, kept, 1).await?;
        ctx.carts.add_item(owner, doomed, 2).await?;

        let version_before = ctx.cart_store.stored_version(owner);

        // Out-of-band catalog deletion leaves a dangling reference.
        ctx.products.delete_product(doomed).await?;

        let cart = ctx.carts.get_cart(owner).await?;

        assert!(cart.find_item(doomed).is_none(), "dangling item is dropped");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.subtotal, 3_00);
        assert!(
            ctx.cart_store.stored_version(owner) > version_before,
            "the repaired aggregate must be persisted"
        );

        // The stored document is clean now; the next read does not write.
        let version_after_repair = ctx.cart_store.stored_version(owner);
        let cart = ctx.carts.get_cart(owner).await?;

        assert_eq!(cart.subtotal, 3_00);
        assert_eq!(ctx.cart_store.stored_version(owner), version_after_repair);

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_drops_malformed_rows_left_by_partial_writes() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let kept = seed_product(&ctx, 3_00, 50).await?;
        let corrupt = seed_product(&ctx, 5_00, 50).await?;

        let saved = ctx.carts.add_item(owner, kept, 1).await?;

        // Inject a zero-price row as a partial write would leave it.
        let mut damaged = saved.clone();
        damaged.items.push(CartItem {
            product: corrupt,
            quantity: 2,
            unit_price: 0,
            line_total: 0,
        });
        ctx.cart_store.put_cart_raw(damaged);

        let cart = ctx.carts.get_cart(owner).await?;

        assert!(cart.find_item(corrupt).is_none(), "malformed row is dropped");
        assert_eq!(cart.subtotal, 3_00);

        Ok(())
    }

    #[tokio::test]
    async fn subtotal_matches_line_totals_after_every_mutation() -> TestResult {
        let ctx = TestContext::new();
        let owner = OwnerUuid::new();
        let first = seed_product(&ctx, 10_00, 50).await?;
        let second = seed_product(&ctx, 2_50, 50).await?;

        let assert_consistent = |cart: &Cart| {
            let expected: u64 = cart.items.iter().map(|i| i.line_total).sum();

            assert_eq!(cart.subtotal, expected, "subtotal must equal line sum");

            for item in &cart.items {
                assert_eq!(
                    item.line_total,
                    item.unit_price * u64::from(item.quantity),
                    "line total must equal quantity times unit price"
                );
            }
        };

        assert_consistent(&ctx.carts.add_item(owner, first, 2).await?);
        assert_consistent(&ctx.carts.add_item(owner, second, 4).await?);
        assert_consistent(&ctx.carts.update_item_quantity(owner, first, 9).await?);
        assert_consistent(&ctx.carts.remove_item(owner, second).await?);
        assert_consistent(&ctx.carts.clear_cart(owner).await?);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_retries_after_a_version_conflict() -> TestResult {
        let mut store = MockCartStore::new();
        let mut catalog = MockCatalogStore::new();
        let mut seq = Sequence::new();

        catalog.expect_resolve_product().returning(|_| {
            Ok(Some(ProductSnapshot {
                price: 10_00,
                stock: 10,
            }))
        });

        store.expect_find_cart().returning(|_| Ok(None));

        store
            .expect_save_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(StorageError::Conflict));

        store
            .expect_save_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|cart| {
                let mut saved = cart.clone();
                saved.version += 1;

                Ok(saved)
            });

        let service = CartService::new(Arc::new(store), Arc::new(catalog));

        let cart = service
            .add_item(OwnerUuid::new(), ProductUuid::new(), 1)
            .await?;

        assert_eq!(cart.version, 1);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_gives_up_after_repeated_conflicts() {
        let mut store = MockCartStore::new();
        let mut catalog = MockCatalogStore::new();

        catalog.expect_resolve_product().returning(|_| {
            Ok(Some(ProductSnapshot {
                price: 10_00,
                stock: 10,
            }))
        });

        store.expect_find_cart().returning(|_| Ok(None));

        store
            .expect_save_cart()
            .times(MAX_SAVE_ATTEMPTS as usize)
            .returning(|_| Err(StorageError::Conflict));

        let service = CartService::new(Arc::new(store), Arc::new(catalog));

        let result = service
            .add_item(OwnerUuid::new(), ProductUuid::new(), 1)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::ConcurrentModification)),
            "expected ConcurrentModification, got {result:?}"
        );
    }

    #[tokio::test]
    async fn storage_failures_surface_unmasked() {
        let mut store = MockCartStore::new();
        let catalog = MockCatalogStore::new();

        store
            .expect_find_cart()
            .returning(|_| Err(StorageError::Backend(Box::new(std::io::Error::other("boom")))));

        let service = CartService::new(Arc::new(store), Arc::new(catalog));

        let result = service.get_cart(OwnerUuid::new()).await;

        assert!(
            matches!(result, Err(CartsServiceError::Storage(_))),
            "expected Storage, got {result:?}"
        );
    }

    #[tokio::test]
    async fn get_cart_serves_repaired_view_when_repair_persist_conflicts() -> TestResult {
        let mut store = MockCartStore::new();
        let mut catalog = MockCatalogStore::new();
        let owner = OwnerUuid::new();

        // One item whose product no longer resolves.
        store.expect_find_cart().returning(move |_| {
            let mut cart = Cart::new(owner);
            cart.merge_item(ProductUuid::new(), 1, 10_00)
                .map_err(|e| StorageError::Backend(Box::new(e)))?;
            cart.version = 3;

            Ok(Some(cart))
        });

        catalog.expect_resolve_product().returning(|_| Ok(None));

        store
            .expect_save_cart()
            .times(1)
            .returning(|_| Err(StorageError::Conflict));

        let service = CartService::new(Arc::new(store), Arc::new(catalog));

        let cart = service.get_cart(owner).await?;

        assert!(cart.items.is_empty(), "the view is still repaired");
        assert_eq!(cart.subtotal, 0);

        Ok(())
    }
}
