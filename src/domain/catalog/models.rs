//! Catalog models.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::ProductUuid;

/// A stored value did not match any known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind} value: {value}")]
pub struct UnknownVariantError {
    kind: &'static str,
    value: String,
}

macro_rules! catalog_enum {
    (
        $(#[$meta:meta])* $name:ident, $kind:literal,
        { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(
                #[doc = $text]
                $variant,
            )+
        }

        impl $name {
            /// Stable textual form used in persistence.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariantError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariantError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

catalog_enum! {
    /// Product category.
    Category, "category",
    {
        Seeds => "seeds",
        Fertilizers => "fertilizers",
        Pesticides => "pesticides",
        FarmTools => "farm_tools",
        IrrigationEquipment => "irrigation_equipment",
        OrganicProducts => "organic_products",
        AnimalFeed => "animal_feed",
        PlantProtection => "plant_protection",
        AgriculturalMachinery => "agricultural_machinery",
    }
}

catalog_enum! {
    /// Unit a product's stock is counted in.
    StockUnit, "unit",
    {
        Kilogram => "kg",
        Gram => "g",
        Litre => "l",
        Millilitre => "ml",
        Pieces => "pieces",
        Packets => "packets",
        Bags => "bags",
    }
}

/// Catalog product. Prices are in minor currency units.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub uuid: ProductUuid,
    pub name: String,
    pub category: Category,
    pub brand: String,
    pub unit: StockUnit,
    pub price: u64,
    pub stock: u64,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// Fields for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub category: Category,
    pub brand: String,
    pub unit: StockUnit,
    pub price: u64,
    pub stock: u64,
    pub description: Option<String>,
}

/// Replacement fields for updating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpdate {
    pub name: String,
    pub category: Category,
    pub brand: String,
    pub unit: StockUnit,
    pub price: u64,
    pub stock: u64,
    pub description: Option<String>,
}

/// The slice of a product the cart engine reads: current price and stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub price: u64,
    pub stock: u64,
}

/// A product field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProductValidationError {
    /// Name was empty or whitespace.
    #[error("product name must not be empty")]
    EmptyName,

    /// Brand was empty or whitespace.
    #[error("product brand must not be empty")]
    EmptyBrand,

    /// Price below one minor unit.
    #[error("product price must be at least one minor unit")]
    ZeroPrice,
}

/// Validate the writable product fields shared by create and update.
///
/// # Errors
///
/// Returns the first failing [`ProductValidationError`].
pub fn validate_product_fields(
    name: &str,
    brand: &str,
    price: u64,
) -> Result<(), ProductValidationError> {
    if name.trim().is_empty() {
        return Err(ProductValidationError::EmptyName);
    }

    if brand.trim().is_empty() {
        return Err(ProductValidationError::EmptyBrand);
    }

    if price == 0 {
        return Err(ProductValidationError::ZeroPrice);
    }

    Ok(())
}
