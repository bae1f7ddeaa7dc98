use mpg_common::Krw;

use crate::db_types::{CheckoutStatus, GapReason, PendingCheckout};

/// The result of trying to claim a checkout attempt for confirmation.
#[derive(Debug, Clone)]
pub enum CheckoutClaim {
    /// This caller won the claim; it alone may run the provider confirmation.
    Claimed(PendingCheckout),
    /// Another invocation already claimed the checkout. Carries the status it has reached.
    AlreadyProcessed(CheckoutStatus),
    /// No checkout attempt exists for the given correlation token.
    NotFound,
}

#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
    pub payment_key: String,
    pub checkout_id: String,
    pub amount: Krw,
}

#[derive(Debug, Clone)]
pub struct NewReconciliationGap {
    pub checkout_id: String,
    pub payment_key: String,
    pub amount: Krw,
    pub reason: GapReason,
    pub detail: String,
}
