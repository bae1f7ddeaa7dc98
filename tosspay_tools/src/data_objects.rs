use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The provider's payment object, reduced to the fields the gateway consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TossPayment {
    pub payment_key: String,
    pub order_id: String,
    pub total_amount: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

/// The provider's error payload. Not every failure body carries a code, and some carry no JSON at
/// all; the raw body is used as the message in that case.
#[derive(Debug, Clone, Deserialize)]
pub struct TossErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// Normalized result of a confirmation attempt. A provider-side rejection is an expected,
/// recoverable business result and is represented with `success: false`, never as an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<TossPayment>,
}

/// Normalized result of a cancellation. The provider's error message is propagated on failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<TossPayment>,
}
