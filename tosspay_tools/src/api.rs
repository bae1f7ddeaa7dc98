use std::sync::Arc;

use log::*;
use mpg_common::Krw;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
    Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::{
    config::TossPayConfig,
    data_objects::{CancelResult, ConfirmResult, TossErrorBody, TossPayment},
    TossPayApiError,
};

#[derive(Clone)]
pub struct TossPayApi {
    config: TossPayConfig,
    client: Arc<Client>,
}

impl TossPayApi {
    pub fn new(config: TossPayConfig) -> Result<Self, TossPayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        // The API authenticates with the secret key as a Basic credential; the key is the
        // username and the password is empty, hence the trailing colon.
        let credential = base64::encode(format!("{}:", config.secret_key.reveal()));
        let val = HeaderValue::from_str(&format!("Basic {credential}"))
            .map_err(|e| TossPayApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TossPayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, TossPayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| TossPayApiError::Unreachable(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| TossPayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = error_message(response).await;
            Err(TossPayApiError::QueryError { status, message })
        }
    }

    /// Confirms a payment after the buyer returns from the payment widget.
    ///
    /// A provider-side rejection (declined card, exceeded limit, amount mismatch) is an expected
    /// outcome and comes back as `success: false` with the provider's message embedded. Only
    /// transport failures, where the charge state is unknown, return an error.
    pub async fn confirm(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: Krw,
    ) -> Result<ConfirmResult, TossPayApiError> {
        debug!("💳️ Confirming payment [{payment_key}] for order [{order_id}] ({amount})");
        let body = json!({
            "paymentKey": payment_key,
            "orderId": order_id,
            "amount": amount.value(),
        });
        match self.rest_query::<TossPayment, Value>(Method::POST, "/payments/confirm", Some(body)).await {
            Ok(payment) => {
                info!("💳️ Payment [{payment_key}] approved");
                Ok(ConfirmResult { success: true, message: "결제 승인 완료".to_string(), payment: Some(payment) })
            },
            Err(TossPayApiError::QueryError { status, message }) => {
                debug!("💳️ Payment [{payment_key}] rejected by the provider ({status}): {message}");
                Ok(ConfirmResult {
                    success: false,
                    message: format!("토스페이먼츠 결제 승인 실패: {message}"),
                    payment: None,
                })
            },
            Err(e) => Err(e),
        }
    }

    /// Read-only passthrough of the provider's payment state.
    pub async fn get_status(&self, payment_key: &str) -> Result<TossPayment, TossPayApiError> {
        let path = format!("/payments/{payment_key}");
        debug!("💳️ Fetching status for payment [{payment_key}]");
        self.rest_query::<TossPayment, ()>(Method::GET, &path, None).await
    }

    /// Cancels a payment, fully when `amount` is omitted, partially otherwise.
    pub async fn cancel(
        &self,
        payment_key: &str,
        reason: &str,
        amount: Option<Krw>,
    ) -> Result<CancelResult, TossPayApiError> {
        let path = format!("/payments/{payment_key}/cancel");
        let mut body = json!({ "cancelReason": reason });
        if let Some(amount) = amount {
            body["cancelAmount"] = json!(amount.value());
            debug!("💳️ Cancelling {amount} of payment [{payment_key}]: {reason}");
        } else {
            debug!("💳️ Cancelling payment [{payment_key}] in full: {reason}");
        }
        match self.rest_query::<TossPayment, Value>(Method::POST, &path, Some(body)).await {
            Ok(payment) => {
                info!("💳️ Payment [{payment_key}] cancelled");
                Ok(CancelResult { success: true, message: "결제 취소 완료".to_string(), payment: Some(payment) })
            },
            Err(TossPayApiError::QueryError { status, message }) => {
                debug!("💳️ Cancellation of [{payment_key}] rejected ({status}): {message}");
                Ok(CancelResult {
                    success: false,
                    message: format!("토스페이먼츠 결제 취소 실패: {message}"),
                    payment: None,
                })
            },
            Err(e) => Err(e),
        }
    }
}

/// Extracts a human-readable message from a failure response. The provider normally answers with
/// a `{code, message}` body, but proxies in between may not; the raw body is the fallback.
async fn error_message(response: Response) -> String {
    let raw = response.text().await.unwrap_or_default();
    match serde_json::from_str::<TossErrorBody>(&raw) {
        Ok(body) => {
            if let Some(code) = body.code {
                trace!("Provider error code: {code}");
            }
            body.message
        },
        Err(_) => raw,
    }
}
