use std::fmt::Display;

use market_payment_engine::db_types::CartEntry;
use mpg_common::Krw;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The `{success, data}` arm of the storefront contract.
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// `POST /orders` body. The legacy storefront sends `userId`; newer clients send `customerId`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderParams {
    #[serde(alias = "userId")]
    pub customer_id: String,
    pub items: Vec<CartEntry>,
    #[serde(default)]
    pub total_price: Option<Krw>,
}

/// `POST /checkouts` body. The buyer identity may be absent; a checkout without one can still be
/// paid, but lands in the reconciliation queue instead of becoming an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutParams {
    #[serde(default, alias = "userId")]
    pub customer_id: Option<String>,
    pub items: Vec<CartEntry>,
    pub total_price: Krw,
}

/// The identifiers the payment widget appends to the success redirect. `orderId` carries our
/// checkout correlation token back to us.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmParams {
    pub payment_key: String,
    pub order_id: String,
    pub amount: Krw,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelParams {
    pub cancel_reason: String,
    #[serde(default)]
    pub cancel_amount: Option<Krw>,
}

/// `PATCH /seller/orders/{id}/status` body. The status may be an English code or a legacy Korean
/// label; it is canonicalised before it touches the engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusParams {
    pub status: String,
    pub seller_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCreated {
    pub checkout_id: String,
    pub claimed_total: Krw,
}
