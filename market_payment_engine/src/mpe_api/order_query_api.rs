use std::fmt::Debug;

use log::*;

use crate::{
    db_types::OrderId,
    order_objects::{OrderView, SellerStats},
    traits::{OrderManagement, PaymentGatewayError},
};

/// Read-side queries over orders: the buyer's order history and the seller back-office views.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi")
    }
}

impl<B> OrderQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<OrderView, PaymentGatewayError> {
        self.db.order_view(order_id).await?.ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))
    }

    /// The customer's order history, newest first.
    pub async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError> {
        let orders = self.db.orders_for_customer(customer_id).await?;
        trace!("💻️📦️ {} order(s) fetched for customer {customer_id}", orders.len());
        Ok(orders)
    }

    /// Orders containing at least one of the seller's products, newest first.
    pub async fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError> {
        let orders = self.db.orders_for_seller(seller_id).await?;
        trace!("💻️📦️ {} order(s) fetched for seller {seller_id}", orders.len());
        Ok(orders)
    }

    pub async fn seller_stats(&self, seller_id: &str) -> Result<SellerStats, PaymentGatewayError> {
        self.db.seller_stats(seller_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
