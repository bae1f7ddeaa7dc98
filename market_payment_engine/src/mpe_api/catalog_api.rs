use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, Product},
    order_objects::ModifyProductRequest,
    traits::{CatalogManagement, PaymentGatewayError},
};

/// Access to the product catalog for the storefront and the seller console.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub async fn add_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError> {
        let product = self.db.insert_product(product).await?;
        debug!("🗂️ Product {} ({}) listed by seller {}", product.id, product.title, product.seller_id);
        Ok(product)
    }

    pub async fn product_by_id(&self, product_id: i64) -> Result<Product, PaymentGatewayError> {
        self.db.fetch_product(product_id).await?.ok_or(PaymentGatewayError::ProductNotFound(product_id))
    }

    /// Applies a partial edit (price, stock, title, brand, image) to a product. Editing the price
    /// never touches existing orders; line items keep the price captured at order time.
    pub async fn update_product(
        &self,
        product_id: i64,
        update: ModifyProductRequest,
    ) -> Result<Product, PaymentGatewayError> {
        let product = self.db.update_product(product_id, update).await?;
        debug!("🗂️ Product {} updated", product.id);
        Ok(product)
    }

    pub async fn products_for_seller(&self, seller_id: &str) -> Result<Vec<Product>, PaymentGatewayError> {
        self.db.products_for_seller(seller_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
