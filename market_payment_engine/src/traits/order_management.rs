use crate::{
    db_types::{Order, OrderId, OrderItem},
    order_objects::{OrderQueryFilter, OrderView, SellerStats},
    traits::PaymentGatewayError,
};

/// Read-side queries over orders, for the storefront and the seller back office.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, PaymentGatewayError>;

    /// The order with its line items expanded with product display data.
    async fn order_view(&self, order_id: &OrderId) -> Result<Option<OrderView>, PaymentGatewayError>;

    /// All orders placed by the customer, newest first.
    async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError>;

    /// All orders containing at least one of the seller's products, newest first.
    async fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError>;

    /// Fetches orders according to the criteria in the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Aggregated dashboard numbers for a seller.
    async fn seller_stats(&self, seller_id: &str) -> Result<SellerStats, PaymentGatewayError>;
}
