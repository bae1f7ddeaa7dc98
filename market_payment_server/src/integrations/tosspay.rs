//! Adapts the Toss Payments client onto the engine's [`PaymentProvider`] seam, so the
//! reconciliation flow never sees the provider's wire format.
use market_payment_engine::traits::{PaymentProvider, ProviderConfirmation, ProviderError};
use mpg_common::Krw;
use tosspay_tools::{TossPayApi, TossPayApiError};

#[derive(Clone)]
pub struct TossGateway {
    api: TossPayApi,
}

impl TossGateway {
    pub fn new(api: TossPayApi) -> Self {
        Self { api }
    }
}

impl PaymentProvider for TossGateway {
    async fn confirm(
        &self,
        payment_key: &str,
        checkout_id: &str,
        amount: Krw,
    ) -> Result<ProviderConfirmation, ProviderError> {
        let result = self.api.confirm(payment_key, checkout_id, amount).await.map_err(|e| match e {
            TossPayApiError::Unreachable(msg) => ProviderError::Unreachable(msg),
            other => ProviderError::Unreachable(other.to_string()),
        })?;
        if result.success {
            Ok(ProviderConfirmation::Approved { approved_at: result.payment.and_then(|p| p.approved_at) })
        } else {
            Ok(ProviderConfirmation::Declined { message: result.message })
        }
    }
}
