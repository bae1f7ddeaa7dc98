use chrono::{DateTime, Utc};
use market_payment_engine::{
    db_types::{
        CheckoutStatus,
        NewCheckout,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        PaymentRecord,
        PaymentStatus,
        PendingCheckout,
        Product,
        ReconciliationGapRecord,
    },
    order_objects::{ModifyProductRequest, OrderQueryFilter, OrderView, SellerStats},
    traits::{
        CatalogManagement,
        CheckoutClaim,
        NewPaymentRecord,
        NewReconciliationGap,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        PaymentProvider,
        ProviderConfirmation,
        ProviderError,
    },
};
use mockall::mock;
use mpg_common::Krw;

mock! {
    pub OrderDb {}

    impl OrderManagement for OrderDb {
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, PaymentGatewayError>;
        async fn order_view(&self, order_id: &OrderId) -> Result<Option<OrderView>, PaymentGatewayError>;
        async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError>;
        async fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError>;
        async fn seller_stats(&self, seller_id: &str) -> Result<SellerStats, PaymentGatewayError>;
    }
}

mock! {
    pub GatewayDb {}

    impl Clone for GatewayDb {
        fn clone(&self) -> Self;
    }

    impl CatalogManagement for GatewayDb {
        async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, PaymentGatewayError>;
        async fn update_product(&self, product_id: i64, update: ModifyProductRequest) -> Result<Product, PaymentGatewayError>;
        async fn decrement_stock(&self, product_id: i64, quantity: i64) -> Result<bool, PaymentGatewayError>;
        async fn products_for_seller(&self, seller_id: &str) -> Result<Vec<Product>, PaymentGatewayError>;
    }

    impl OrderManagement for GatewayDb {
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, PaymentGatewayError>;
        async fn order_view(&self, order_id: &OrderId) -> Result<Option<OrderView>, PaymentGatewayError>;
        async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError>;
        async fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError>;
        async fn seller_stats(&self, seller_id: &str) -> Result<SellerStats, PaymentGatewayError>;
    }

    impl PaymentGatewayDatabase for GatewayDb {
        fn url(&self) -> &str;
        async fn create_order(&self, order: NewOrder, enforce_total: Option<Krw>) -> Result<OrderView, PaymentGatewayError>;
        async fn update_order_status(&self, order_id: &OrderId, status: OrderStatusType, seller_id: &str) -> Result<Order, PaymentGatewayError>;
        async fn insert_checkout(&self, checkout: NewCheckout) -> Result<PendingCheckout, PaymentGatewayError>;
        async fn fetch_checkout(&self, checkout_id: &str) -> Result<Option<PendingCheckout>, PaymentGatewayError>;
        async fn claim_checkout(&self, checkout_id: &str) -> Result<CheckoutClaim, PaymentGatewayError>;
        async fn set_checkout_status(&self, checkout_id: &str, status: CheckoutStatus) -> Result<(), PaymentGatewayError>;
        async fn upsert_payment(&self, payment: NewPaymentRecord) -> Result<(PaymentRecord, bool), PaymentGatewayError>;
        async fn update_payment_status(&self, payment_key: &str, status: PaymentStatus, approved_at: Option<DateTime<Utc>>) -> Result<PaymentRecord, PaymentGatewayError>;
        async fn link_payment_to_order(&self, payment_key: &str, order_id: &OrderId) -> Result<(), PaymentGatewayError>;
        async fn fetch_payment_by_key(&self, payment_key: &str) -> Result<Option<PaymentRecord>, PaymentGatewayError>;
        async fn record_gap(&self, gap: NewReconciliationGap) -> Result<ReconciliationGapRecord, PaymentGatewayError>;
        async fn unresolved_gaps(&self) -> Result<Vec<ReconciliationGapRecord>, PaymentGatewayError>;
    }
}

/// A provider whose behaviour is fixed at construction. Endpoint tests only care about how the
/// HTTP layer maps each reconciliation outcome, not about scripting sequences.
#[derive(Clone, Copy)]
pub enum StubProvider {
    Approving,
    Declining,
    Unreachable,
    /// For routes that must never reach the provider.
    Untouchable,
}

impl PaymentProvider for StubProvider {
    async fn confirm(
        &self,
        _payment_key: &str,
        _checkout_id: &str,
        _amount: Krw,
    ) -> Result<ProviderConfirmation, ProviderError> {
        match self {
            StubProvider::Approving => Ok(ProviderConfirmation::Approved { approved_at: None }),
            StubProvider::Declining => {
                Ok(ProviderConfirmation::Declined { message: "토스페이먼츠 결제 승인 실패: 카드 한도 초과".to_string() })
            },
            StubProvider::Unreachable => Err(ProviderError::Unreachable("connection refused".to_string())),
            StubProvider::Untouchable => panic!("The provider must not be called in this scenario"),
        }
    }
}
