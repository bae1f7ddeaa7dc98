use chrono::{DateTime, Utc};
use mpg_common::Krw;
use thiserror::Error;

/// The outcome of a provider confirmation call. A decline is an ordinary, recoverable business
/// result and is carried in the Ok branch; only transport-level failures surface as
/// [`ProviderError`], because in that case the caller cannot know whether the charge landed.
#[derive(Debug, Clone)]
pub enum ProviderConfirmation {
    Approved { approved_at: Option<DateTime<Utc>> },
    Declined { message: String },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Payment provider unreachable: {0}")]
    Unreachable(String),
}

/// The seam to the external payment confirmation service. Implementations perform the outbound
/// call and nothing else: no order or catalog state may be mutated here.
///
/// The provider's payment key is the correlation identity. Repeated `confirm` calls with the same
/// key must be safe from the caller's perspective; deduplication is the caller's job (see the
/// checkout claim in [`super::PaymentGatewayDatabase`]).
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    async fn confirm(
        &self,
        payment_key: &str,
        checkout_id: &str,
        amount: Krw,
    ) -> Result<ProviderConfirmation, ProviderError>;
}
