use std::fmt::Debug;

use chrono::Utc;
use log::*;
use mpg_common::Krw;

use crate::{
    db_types::{
        CartEntry,
        CheckoutStatus,
        GapReason,
        NewCheckout,
        NewOrder,
        OrderId,
        PaymentStatus,
        PendingCheckout,
        ReconciliationGapRecord,
    },
    order_objects::OrderView,
    traits::{
        CheckoutClaim,
        NewPaymentRecord,
        NewReconciliationGap,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        PaymentProvider,
        ProviderConfirmation,
        ProviderError,
    },
};

/// The result of reconciling a payment redirect. Everything here is an expected business outcome;
/// [`PaymentGatewayError`] is reserved for backend faults.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// Terminal success: the payment is confirmed and an order exists.
    OrderCreated(OrderView),
    /// A previous invocation already claimed this checkout; nothing was done.
    AlreadyProcessed { checkout_id: String, status: CheckoutStatus },
    /// The provider rejected the payment, or the amounts disagreed before confirmation.
    Declined { message: String },
    /// The provider could not be reached. The charge may or may not have landed; the caller must
    /// check the payment status rather than retry the confirmation.
    PaymentPendingUnknown { message: String },
    /// The payment is captured but no order was created. A reconciliation gap has been recorded
    /// for support follow-up; the buyer must still be told the payment itself succeeded.
    ConfirmedWithoutOrder { gap_id: i64, message: String },
}

/// `ReconciliationApi` bridges the client-side "payment succeeded" redirect back into a durable
/// order: it stashes checkout attempts, runs the provider confirmation at most once per attempt,
/// and creates the order only after the provider has approved the charge.
pub struct ReconciliationApi<B, P> {
    db: B,
    provider: P,
}

impl<B, P> Debug for ReconciliationApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, P> ReconciliationApi<B, P> {
    pub fn new(db: B, provider: P) -> Self {
        Self { db, provider }
    }
}

impl<B, P> ReconciliationApi<B, P>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    /// Stashes a new checkout attempt and returns it, including the correlation token the
    /// storefront must hand to the payment widget as its order id.
    ///
    /// The buyer's identity may be absent; the payment can still be confirmed later, but no order
    /// will be created for an anonymous checkout (see [`ReconcileOutcome::ConfirmedWithoutOrder`]).
    pub async fn begin_checkout(
        &self,
        customer_id: Option<String>,
        items: Vec<CartEntry>,
        claimed_total: Krw,
    ) -> Result<PendingCheckout, PaymentGatewayError> {
        if items.is_empty() {
            return Err(PaymentGatewayError::EmptyOrder);
        }
        let pending = self.db.insert_checkout(NewCheckout::new(customer_id, items, claimed_total)).await?;
        debug!("🔄️💳️ Checkout [{}] initiated for {}", pending.checkout_id, pending.claimed_total);
        Ok(pending)
    }

    /// Handles the payment redirect: claims the checkout, confirms the charge with the provider,
    /// and creates the order from the stashed context.
    ///
    /// The claim makes this safe to invoke repeatedly with the same correlation token (rendering
    /// frameworks are fond of firing redirect effects twice) without confirming twice or creating
    /// two orders.
    pub async fn confirm_checkout(
        &self,
        payment_key: &str,
        checkout_id: &str,
        amount: Krw,
    ) -> Result<ReconcileOutcome, PaymentGatewayError> {
        let pending = match self.db.claim_checkout(checkout_id).await? {
            CheckoutClaim::Claimed(pending) => pending,
            CheckoutClaim::AlreadyProcessed(status) => {
                debug!("🔄️💳️ Checkout [{checkout_id}] already claimed (status {status}). Duplicate confirm suppressed");
                return Ok(ReconcileOutcome::AlreadyProcessed { checkout_id: checkout_id.to_string(), status });
            },
            CheckoutClaim::NotFound => return Err(PaymentGatewayError::CheckoutNotFound(checkout_id.to_string())),
        };
        // The provider charged `amount`; it must be the amount the checkout was opened with,
        // otherwise the widget was tampered with and the confirmation must not proceed.
        if amount != pending.claimed_total {
            warn!(
                "🔄️💳️ Checkout [{checkout_id}] amount mismatch: redirect carries {amount}, checkout was opened for {}",
                pending.claimed_total
            );
            self.db.set_checkout_status(checkout_id, CheckoutStatus::Failed).await?;
            return Ok(ReconcileOutcome::Declined {
                message: format!(
                    "결제 금액이 주문 금액과 일치하지 않습니다. (결제 {amount}, 주문 {})",
                    pending.claimed_total
                ),
            });
        }
        let record = NewPaymentRecord {
            payment_key: payment_key.to_string(),
            checkout_id: checkout_id.to_string(),
            amount,
        };
        let (_, inserted) = self.db.upsert_payment(record).await?;
        if !inserted {
            debug!("🔄️💳️ Payment record [{payment_key}] already exists; continuing confirmation");
        }
        match self.provider.confirm(payment_key, checkout_id, amount).await {
            Err(ProviderError::Unreachable(msg)) => {
                // The charge may have landed. Leave the checkout claimed so no second confirm is
                // fired automatically, and tell the caller to check the payment status.
                warn!("🔄️💳️ Provider unreachable while confirming [{payment_key}]: {msg}");
                Ok(ReconcileOutcome::PaymentPendingUnknown {
                    message: "결제 승인 결과를 확인할 수 없습니다. 잠시 후 결제 상태를 조회해 주세요.".to_string(),
                })
            },
            Ok(ProviderConfirmation::Declined { message }) => {
                debug!("🔄️💳️ Confirmation declined for [{payment_key}]: {message}");
                self.db.update_payment_status(payment_key, PaymentStatus::Failed, None).await?;
                self.db.set_checkout_status(checkout_id, CheckoutStatus::Failed).await?;
                Ok(ReconcileOutcome::Declined { message })
            },
            Ok(ProviderConfirmation::Approved { approved_at }) => {
                info!("🔄️💳️ Payment [{payment_key}] confirmed for checkout [{checkout_id}] ({amount})");
                self.db.update_payment_status(payment_key, PaymentStatus::Confirmed, approved_at).await?;
                self.db.set_checkout_status(checkout_id, CheckoutStatus::Confirmed).await?;
                self.finalize_order(payment_key, pending, amount).await
            },
        }
    }

    /// The payment is captured; from here on, every failure is a reconciliation gap rather than a
    /// payment failure.
    async fn finalize_order(
        &self,
        payment_key: &str,
        pending: PendingCheckout,
        amount: Krw,
    ) -> Result<ReconcileOutcome, PaymentGatewayError> {
        let Some(customer_id) = pending.customer_id.clone() else {
            return self
                .record_gap(
                    payment_key,
                    &pending,
                    amount,
                    GapReason::MissingBuyer,
                    "Buyer identity was not available after the payment redirect",
                )
                .await;
        };
        let items = match pending.items() {
            Ok(items) => items,
            Err(e) => {
                return self
                    .record_gap(
                        payment_key,
                        &pending,
                        amount,
                        GapReason::OrderCreationFailed,
                        &format!("Stored checkout items could not be read: {e}"),
                    )
                    .await
            },
        };
        let order = NewOrder {
            order_id: OrderId::from(pending.checkout_id.clone()),
            customer_id,
            items,
            claimed_total: Some(pending.claimed_total),
            created_at: Utc::now(),
        };
        match self.db.create_order(order, Some(amount)).await {
            Ok(view) => {
                self.db.link_payment_to_order(payment_key, &view.order_id).await?;
                self.db.set_checkout_status(&pending.checkout_id, CheckoutStatus::OrderCreated).await?;
                info!("🔄️📦️ Order [{}] created from checkout [{}]", view.order_id, pending.checkout_id);
                Ok(ReconcileOutcome::OrderCreated(view))
            },
            Err(e) => {
                let reason = match &e {
                    PaymentGatewayError::TotalMismatch { .. } => GapReason::AmountMismatch,
                    _ => GapReason::OrderCreationFailed,
                };
                self.record_gap(payment_key, &pending, amount, reason, &e.to_string()).await
            },
        }
    }

    async fn record_gap(
        &self,
        payment_key: &str,
        pending: &PendingCheckout,
        amount: Krw,
        reason: GapReason,
        detail: &str,
    ) -> Result<ReconcileOutcome, PaymentGatewayError> {
        error!(
            "🚨️💳️ Reconciliation gap on checkout [{}]: payment [{payment_key}] for {amount} is confirmed but no \
             order was created. {reason}: {detail}",
            pending.checkout_id
        );
        let gap = self
            .db
            .record_gap(NewReconciliationGap {
                checkout_id: pending.checkout_id.clone(),
                payment_key: payment_key.to_string(),
                amount,
                reason,
                detail: detail.to_string(),
            })
            .await?;
        self.db.set_checkout_status(&pending.checkout_id, CheckoutStatus::Gap).await?;
        Ok(ReconcileOutcome::ConfirmedWithoutOrder {
            gap_id: gap.id,
            message: "결제는 정상적으로 완료되었습니다. 주문 처리가 지연되어 담당자 확인 후 완료됩니다.".to_string(),
        })
    }

    /// The support queue: captured payments still waiting for an order.
    pub async fn unresolved_gaps(&self) -> Result<Vec<ReconciliationGapRecord>, PaymentGatewayError> {
        self.db.unresolved_gaps().await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
