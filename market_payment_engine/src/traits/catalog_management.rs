use crate::{
    db_types::{NewProduct, Product},
    order_objects::ModifyProductRequest,
    traits::PaymentGatewayError,
};

/// Read and write access to the product catalog.
///
/// Stock is the only contended resource in the engine. It is only ever driven down through
/// [`CatalogManagement::decrement_stock`] (directly, or inside the order-creation transaction),
/// which enforces the `stock >= 0` floor atomically.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, PaymentGatewayError>;

    /// Applies a partial update (price, stock, title, brand, image) to a product.
    async fn update_product(
        &self,
        product_id: i64,
        update: ModifyProductRequest,
    ) -> Result<Product, PaymentGatewayError>;

    /// Atomically decrements stock, failing (returning `false`) when fewer than `quantity` units
    /// remain. The check and the decrement are a single statement, so concurrent callers can
    /// never drive stock negative.
    async fn decrement_stock(&self, product_id: i64, quantity: i64) -> Result<bool, PaymentGatewayError>;

    async fn products_for_seller(&self, seller_id: &str) -> Result<Vec<Product>, PaymentGatewayError>;
}
