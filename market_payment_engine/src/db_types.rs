use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mpg_common::Krw;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::{new_checkout_id, new_order_id};

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The order lifecycle. The storefront historically mixed Korean labels and English codes for
/// these states; every inbound string is canonicalised through [`OrderStatusType::from_str`] at
/// the I/O boundary and only the enum travels through business logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been received but payment has not been confirmed.
    Pending,
    /// Payment has been confirmed in full. New orders start here, since payment confirmation
    /// precedes order creation in the checkout flow.
    Paid,
    /// The seller is preparing the shipment.
    Preparing,
    /// The shipment is on its way.
    Shipping,
    /// The shipment has been delivered.
    Completed,
    /// The order has been cancelled. Cancellation is a status, never a row deletion.
    Cancelled,
    /// The buyer exchanged the goods.
    Exchanged,
    /// The buyer returned the goods.
    Returned,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Preparing => write!(f, "Preparing"),
            OrderStatusType::Shipping => write!(f, "Shipping"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
            OrderStatusType::Exchanged => write!(f, "Exchanged"),
            OrderStatusType::Returned => write!(f, "Returned"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" | "주문대기" => Ok(Self::Pending),
            "Paid" | "결제완료" => Ok(Self::Paid),
            "Preparing" | "상품준비중" => Ok(Self::Preparing),
            "Shipping" | "배송중" => Ok(Self::Shipping),
            "Completed" | "배송완료" => Ok(Self::Completed),
            "Cancelled" | "주문취소" => Ok(Self::Cancelled),
            "Exchanged" | "교환" => Ok(Self::Exchanged),
            "Returned" | "반품" => Ok(Self::Returned),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    CheckoutStatus     -------------------------------------------------------
/// State of a checkout attempt, from initiation through reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CheckoutStatus {
    /// The buyer has started a payment attempt and the pending context is stashed.
    Initiated,
    /// The provider confirm call has been claimed. At most one claim succeeds per checkout.
    Confirming,
    /// The provider approved the payment.
    Confirmed,
    /// Terminal success. An order exists for this checkout.
    OrderCreated,
    /// The provider declined, or the amounts disagreed before confirmation.
    Failed,
    /// Payment was captured but no order exists. Requires support follow-up.
    Gap,
}

impl Display for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutStatus::Initiated => write!(f, "Initiated"),
            CheckoutStatus::Confirming => write!(f, "Confirming"),
            CheckoutStatus::Confirmed => write!(f, "Confirmed"),
            CheckoutStatus::OrderCreated => write!(f, "OrderCreated"),
            CheckoutStatus::Failed => write!(f, "Failed"),
            CheckoutStatus::Gap => write!(f, "Gap"),
        }
    }
}

//--------------------------------------    PaymentStatus      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Initiated,
    Confirmed,
    Failed,
    Cancelled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Initiated => write!(f, "Initiated"),
            PaymentStatus::Confirmed => write!(f, "Confirmed"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

//--------------------------------------      GapReason        -------------------------------------------------------
/// Why a confirmed payment could not be reconciled into an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum GapReason {
    /// The buyer's identity did not survive the payment redirect.
    MissingBuyer,
    /// The server-side order total disagreed with the captured amount.
    AmountMismatch,
    /// Order creation failed after the charge was captured.
    OrderCreationFailed,
}

impl Display for GapReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GapReason::MissingBuyer => write!(f, "MissingBuyer"),
            GapReason::AmountMismatch => write!(f, "AmountMismatch"),
            GapReason::OrderCreationFailed => write!(f, "OrderCreationFailed"),
        }
    }
}

//--------------------------------------        Product        -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub unit_price: Krw,
    pub stock: i64,
    pub seller_id: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewProduct      -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    pub unit_price: Krw,
    pub stock: i64,
    pub seller_id: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

//--------------------------------------        CartEntry      -------------------------------------------------------
/// One line of checkout input: a product, a quantity and the unit price the storefront displayed.
/// The displayed price is a hint only; the catalog price at order time is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Option<Krw>,
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub total_price: Krw,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       OrderItem       -------------------------------------------------------
/// A line item. `unit_price` is captured when the order is created and never changes afterwards,
/// regardless of later catalog edits.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Krw,
}

//--------------------------------------        NewOrder       -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The public order id. Orders created from a checkout reuse the checkout's correlation
    /// token so that the payment record and the order share an identity.
    pub order_id: OrderId,
    pub customer_id: String,
    pub items: Vec<CartEntry>,
    /// The total the storefront claimed. Display hint only; the engine recomputes.
    pub claimed_total: Option<Krw>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(customer_id: String, items: Vec<CartEntry>) -> Self {
        Self { order_id: new_order_id(), customer_id, items, claimed_total: None, created_at: Utc::now() }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        self
    }

    pub fn with_claimed_total(mut self, total: Krw) -> Self {
        self.claimed_total = Some(total);
        self
    }
}

//--------------------------------------    PendingCheckout    -------------------------------------------------------
/// The stashed context of a checkout attempt, keyed by the correlation token the payment widget
/// carries through the redirect as its order id.
#[derive(Debug, Clone, FromRow)]
pub struct PendingCheckout {
    pub id: i64,
    pub checkout_id: String,
    /// Absent when the buyer's session did not survive the redirect.
    pub customer_id: Option<String>,
    pub items_json: String,
    pub claimed_total: Krw,
    pub status: CheckoutStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PendingCheckout {
    pub fn items(&self) -> Result<Vec<CartEntry>, serde_json::Error> {
        serde_json::from_str(&self.items_json)
    }
}

//--------------------------------------      NewCheckout      -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub checkout_id: String,
    pub customer_id: Option<String>,
    pub items: Vec<CartEntry>,
    pub claimed_total: Krw,
}

impl NewCheckout {
    pub fn new(customer_id: Option<String>, items: Vec<CartEntry>, claimed_total: Krw) -> Self {
        Self { checkout_id: new_checkout_id(), customer_id, items, claimed_total }
    }
}

//--------------------------------------     PaymentRecord     -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: i64,
    /// The provider's correlation identity for this payment.
    pub payment_key: String,
    pub checkout_id: String,
    /// Linked once an order has been created for this payment.
    pub order_id: Option<OrderId>,
    pub amount: Krw,
    pub status: PaymentStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//-------------------------------------- ReconciliationGapRecord -----------------------------------------------------
/// A captured payment with no corresponding order. These rows are the support queue; they are
/// never silently discarded.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationGapRecord {
    pub id: i64,
    pub checkout_id: String,
    pub payment_key: String,
    pub amount: Krw,
    pub reason: GapReason,
    pub detail: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::OrderStatusType;

    #[test]
    fn korean_labels_canonicalise() {
        assert_eq!(OrderStatusType::from_str("배송중").unwrap(), OrderStatusType::Shipping);
        assert_eq!(OrderStatusType::from_str("결제완료").unwrap(), OrderStatusType::Paid);
        assert_eq!(OrderStatusType::from_str("반품").unwrap(), OrderStatusType::Returned);
        assert_eq!(OrderStatusType::from_str("Preparing").unwrap(), OrderStatusType::Preparing);
        assert!(OrderStatusType::from_str("whatever").is_err());
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in [
            OrderStatusType::Pending,
            OrderStatusType::Paid,
            OrderStatusType::Preparing,
            OrderStatusType::Shipping,
            OrderStatusType::Completed,
            OrderStatusType::Cancelled,
            OrderStatusType::Exchanged,
            OrderStatusType::Returned,
        ] {
            assert_eq!(OrderStatusType::from_str(&status.to_string()).unwrap(), status);
        }
    }
}
