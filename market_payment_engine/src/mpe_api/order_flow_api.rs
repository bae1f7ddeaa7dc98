use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    order_objects::{OrderQueryFilter, OrderView},
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
};

/// `OrderFlowApi` is the primary API for creating orders and moving them through their lifecycle.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Submit a new order.
    ///
    /// Every line item is validated against the catalog and stock is decremented as part of one
    /// atomic unit of work; on any failure nothing is persisted and no stock changes. The total
    /// is recomputed from catalog prices, so a stale client-side total never leaks into the
    /// stored order.
    pub async fn create_order(&self, order: NewOrder) -> Result<OrderView, PaymentGatewayError> {
        debug!(
            "🔄️📦️ Creating order [{}] for customer {} with {} line item(s)",
            order.order_id,
            order.customer_id,
            order.items.len()
        );
        let view = self.db.create_order(order, None).await?;
        debug!("🔄️📦️ Order [{}] created. Total: {}", view.order_id, view.total_price);
        Ok(view)
    }

    /// Fetches a single order with its line items expanded.
    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<OrderView, PaymentGatewayError> {
        self.db.order_view(order_id).await?.ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))
    }

    /// Changes the status of an order on behalf of a seller.
    ///
    /// The change is only permitted if the order contains at least one line item belonging to a
    /// product owned by `seller_id`. No transition table is enforced beyond the canonical status
    /// set; sellers move orders freely between preparing, shipping and the terminal states.
    pub async fn update_status_for_seller(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
        seller_id: &str,
    ) -> Result<Order, PaymentGatewayError> {
        trace!("🔄️📦️ Seller {seller_id} requests status {new_status} for order [{order_id}]");
        let order = self.db.update_order_status(order_id, new_status, seller_id).await?;
        debug!("🔄️📦️ Order [{order_id}] moved to {new_status} by seller {seller_id}");
        Ok(order)
    }

    /// Fetches orders according to criteria specified in the filter, newest first.
    pub async fn search(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError> {
        trace!("🔄️📦️ Order search: {query}");
        self.db.search_orders(query).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
