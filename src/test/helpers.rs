//! Test Helpers

use crate::{
    domain::catalog::{
        ProductsServiceError,
        models::{Category, NewProduct, StockUnit},
        service::ProductsService,
    },
    ids::ProductUuid,
    test::TestContext,
};

/// A well-formed product with the given identity, price and stock.
pub(crate) fn new_product(uuid: ProductUuid, price: u64, stock: u64) -> NewProduct {
    NewProduct {
        uuid,
        name: "Tomato Seeds".to_string(),
        category: Category::Seeds,
        brand: "GreenGrow".to_string(),
        unit: StockUnit::Packets,
        price,
        stock,
        description: None,
    }
}

/// Create a catalog product and return its identifier.
pub(crate) async fn seed_product(
    ctx: &TestContext,
    price: u64,
    stock: u64,
) -> Result<ProductUuid, ProductsServiceError> {
    let uuid = ProductUuid::new();

    ctx.products
        .create_product(new_product(uuid, price, stock))
        .await?;

    Ok(uuid)
}
