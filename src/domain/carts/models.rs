//! Cart aggregate.
//!
//! A [`Cart`] is the unit of consistency for everything a shopper has picked:
//! one document per owner, holding line items keyed by product. Line totals
//! and the subtotal are derived values and are re-derived by every mutating
//! method here; nothing outside this module writes them directly.

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{CartUuid, OwnerUuid, ProductUuid};

/// A cart amount left the representable range during recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cart amount exceeds the representable range")]
pub struct AmountOverflow;

/// One product entry within a cart.
///
/// `unit_price` is the price snapshotted when the product was first added; it
/// is deliberately never refreshed from the catalog on later quantity
/// changes. `line_total` always equals `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: ProductUuid,
    pub quantity: u32,
    pub unit_price: u64,
    pub line_total: u64,
}

impl CartItem {
    fn new(product: ProductUuid, quantity: u32, unit_price: u64) -> Result<Self, AmountOverflow> {
        Ok(Self {
            product,
            quantity,
            unit_price,
            line_total: line_total(quantity, unit_price)?,
        })
    }

    fn set_quantity(&mut self, quantity: u32) -> Result<(), AmountOverflow> {
        self.quantity = quantity;
        self.line_total = line_total(quantity, self.unit_price)?;

        Ok(())
    }

    /// Whether this row satisfies the line-item invariants. Stored rows can
    /// violate them after out-of-band writes; the repair path filters those.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.quantity > 0 && self.unit_price > 0 && self.line_total > 0
    }
}

fn line_total(quantity: u32, unit_price: u64) -> Result<u64, AmountOverflow> {
    unit_price
        .checked_mul(u64::from(quantity))
        .ok_or(AmountOverflow)
}

/// Outcome of a [`Cart::repair`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    /// Number of line items dropped for failing validation or resolution.
    pub dropped: usize,
    /// Whether the aggregate differs from its stored form and needs
    /// re-persisting.
    pub changed: bool,
}

/// Per-owner cart document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub uuid: CartUuid,
    pub owner: OwnerUuid,
    pub items: Vec<CartItem>,
    pub subtotal: u64,
    pub total: u64,
    /// Optimistic-concurrency version. Zero means the document has never
    /// been persisted; stores bump it on every successful save.
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cart {
    /// An empty, never-persisted cart for the given owner.
    #[must_use]
    pub fn new(owner: OwnerUuid) -> Self {
        let now = Timestamp::now();

        Self {
            uuid: CartUuid::new(),
            owner,
            items: Vec::new(),
            subtotal: 0,
            total: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up the line item for a product.
    #[must_use]
    pub fn find_item(&self, product: ProductUuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product == product)
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` of a product at the given unit price.
    ///
    /// If the product is already present the quantities merge and the
    /// existing price snapshot is kept; otherwise a new line item is appended
    /// with `unit_price` as its snapshot. Totals are re-derived either way.
    ///
    /// # Errors
    ///
    /// Returns [`AmountOverflow`] if a quantity or amount leaves the
    /// representable range.
    pub fn merge_item(
        &mut self,
        product: ProductUuid,
        quantity: u32,
        unit_price: u64,
    ) -> Result<(), AmountOverflow> {
        match self.items.iter_mut().find(|item| item.product == product) {
            Some(existing) => {
                let merged = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or(AmountOverflow)?;

                existing.set_quantity(merged)?;
            }
            None => {
                let item = CartItem::new(product, quantity, unit_price)?;

                self.items.push(item);
            }
        }

        self.recompute_totals()
    }

    /// Set the quantity of an existing line item, keeping its price
    /// snapshot. A no-op when the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`AmountOverflow`] if the new line total leaves the
    /// representable range.
    pub fn set_item_quantity(
        &mut self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), AmountOverflow> {
        if let Some(item) = self.items.iter_mut().find(|item| item.product == product) {
            item.set_quantity(quantity)?;
        }

        self.recompute_totals()
    }

    /// Remove the line item for a product. Returns whether one was present.
    ///
    /// # Errors
    ///
    /// Returns [`AmountOverflow`] if recomputing the subtotal fails.
    pub fn remove_item(&mut self, product: ProductUuid) -> Result<bool, AmountOverflow> {
        let before = self.items.len();

        self.items.retain(|item| item.product != product);

        let removed = self.items.len() != before;

        self.recompute_totals()?;

        Ok(removed)
    }

    /// Empty the cart. The document stays alive with zero items.
    pub fn clear(&mut self) {
        self.items.clear();
        self.subtotal = 0;
        self.total = 0;
    }

    /// Drop line items that no longer resolve against the catalog or violate
    /// the line-item invariants, then re-derive the totals.
    ///
    /// This is drift repair, not a business rule: it exists so a read after
    /// an out-of-band product deletion or a partial write returns a
    /// consistent view. The report says whether the stored form needs to be
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`AmountOverflow`] if recomputing the subtotal fails.
    pub fn repair(
        &mut self,
        known_products: &FxHashSet<ProductUuid>,
    ) -> Result<RepairReport, AmountOverflow> {
        let items_before = self.items.len();
        let subtotal_before = self.subtotal;

        self.items
            .retain(|item| known_products.contains(&item.product) && item.is_well_formed());

        self.recompute_totals()?;

        let dropped = items_before - self.items.len();

        Ok(RepairReport {
            dropped,
            changed: dropped > 0 || self.subtotal != subtotal_before,
        })
    }

    fn recompute_totals(&mut self) -> Result<(), AmountOverflow> {
        let mut subtotal: u64 = 0;

        for item in &self.items {
            subtotal = subtotal.checked_add(item.line_total).ok_or(AmountOverflow)?;
        }

        self.subtotal = subtotal;
        // Shipping and tax are not applied at the cart stage.
        self.total = subtotal;

        Ok(())
    }
}
