use chrono::{DateTime, Utc};
use mpg_common::Krw;
use thiserror::Error;

use crate::{
    db_types::{
        CheckoutStatus,
        NewCheckout,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        PaymentRecord,
        PaymentStatus,
        PendingCheckout,
        ReconciliationGapRecord,
    },
    order_objects::OrderView,
    traits::{
        data_objects::{CheckoutClaim, NewPaymentRecord, NewReconciliationGap},
        CatalogManagement,
        OrderManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the Market Payment
/// Engine.
///
/// This behaviour includes:
/// * Creating orders atomically against the catalog (stock decrement + order + line items as one
///   unit of work).
/// * Managing the lifecycle of checkout attempts and their payment records.
/// * Recording reconciliation gaps when a captured payment cannot be matched to an order.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + CatalogManagement + OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Takes a new order and, in a single atomic unit of work, validates every line against the
    /// catalog, decrements stock, and stores the order with its line items. Either every
    /// decrement and every insert lands, or none do; no partial effect is ever observable by a
    /// concurrent reader.
    ///
    /// The order total is recomputed from catalog prices. A client-claimed total that disagrees
    /// is logged and ignored. When `enforce_total` is given (the reconciliation path, where money
    /// has already moved), a recomputed total that differs from it aborts the whole operation
    /// with [`PaymentGatewayError::TotalMismatch`].
    async fn create_order(&self, order: NewOrder, enforce_total: Option<Krw>) -> Result<OrderView, PaymentGatewayError>;

    /// Updates the status of an order on behalf of a seller. Permitted only when the order
    /// contains at least one line item belonging to a product owned by `seller_id`.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        seller_id: &str,
    ) -> Result<Order, PaymentGatewayError>;

    /// Stashes a new checkout attempt with `Initiated` status.
    async fn insert_checkout(&self, checkout: NewCheckout) -> Result<PendingCheckout, PaymentGatewayError>;

    /// Fetches a checkout attempt by its correlation token.
    async fn fetch_checkout(&self, checkout_id: &str) -> Result<Option<PendingCheckout>, PaymentGatewayError>;

    /// Atomically claims a checkout for confirmation (`Initiated` -> `Confirming`). At most one
    /// caller ever receives [`CheckoutClaim::Claimed`] for a given checkout; later callers see
    /// [`CheckoutClaim::AlreadyProcessed`] with the status the checkout had moved to.
    async fn claim_checkout(&self, checkout_id: &str) -> Result<CheckoutClaim, PaymentGatewayError>;

    /// Moves a checkout to the given status.
    async fn set_checkout_status(&self, checkout_id: &str, status: CheckoutStatus) -> Result<(), PaymentGatewayError>;

    /// Records a payment for a checkout. This call is idempotent on the payment key; the second
    /// element of the result is `false` when the record already existed.
    async fn upsert_payment(&self, payment: NewPaymentRecord) -> Result<(PaymentRecord, bool), PaymentGatewayError>;

    /// Updates the status of a payment record, optionally capturing the provider's approval
    /// timestamp.
    async fn update_payment_status(
        &self,
        payment_key: &str,
        status: PaymentStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<PaymentRecord, PaymentGatewayError>;

    /// Links a payment record to the order that was created for it.
    async fn link_payment_to_order(&self, payment_key: &str, order_id: &OrderId) -> Result<(), PaymentGatewayError>;

    /// Fetches the payment record for the given payment key.
    async fn fetch_payment_by_key(&self, payment_key: &str) -> Result<Option<PaymentRecord>, PaymentGatewayError>;

    /// Durably records a reconciliation gap: payment captured, no order created.
    async fn record_gap(&self, gap: NewReconciliationGap) -> Result<ReconciliationGapRecord, PaymentGatewayError>;

    /// All gaps that have not been resolved by support yet, newest first.
    async fn unresolved_gaps(&self) -> Result<Vec<ReconciliationGapRecord>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Insufficient stock for product {product_id} ({title}): requested {requested}, available {available}")]
    InsufficientStock { product_id: i64, title: String, requested: i64, available: i64 },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("An order must contain at least one line item")]
    EmptyOrder,
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },
    #[error("Order total {computed} does not match the confirmed payment amount {expected}")]
    TotalMismatch { expected: Krw, computed: Krw },
    #[error("The checkout attempt {0} does not exist")]
    CheckoutNotFound(String),
    #[error("The requested payment does not exist for payment key {0}")]
    PaymentNotFound(String),
    #[error("Order {order_id} does not contain any products sold by {seller_id}")]
    NotSellerOrder { order_id: OrderId, seller_id: String },
    #[error("Stored checkout items could not be read: {0}")]
    MalformedCheckout(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
