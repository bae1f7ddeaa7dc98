use log::*;
use mpg_common::Secret;

pub const DEFAULT_TOSS_API_URL: &str = "https://api.tosspayments.com/v1";

#[derive(Debug, Clone)]
pub struct TossPayConfig {
    /// Base URL of the payments API, including the version segment.
    pub base_url: String,
    /// The merchant secret key. Sent base64-encoded with a trailing colon as a Basic credential.
    pub secret_key: Secret<String>,
}

impl Default for TossPayConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_TOSS_API_URL.to_string(), secret_key: Secret::default() }
    }
}

impl TossPayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MPG_TOSS_API_URL").unwrap_or_else(|_| {
            info!("MPG_TOSS_API_URL not set, using {DEFAULT_TOSS_API_URL} as default");
            DEFAULT_TOSS_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("MPG_TOSS_SECRET_KEY").unwrap_or_else(|_| {
            warn!("MPG_TOSS_SECRET_KEY not set, using the documented sandbox key. Confirmations will not settle.");
            "test_sk_0000000000000000".to_string()
        }));
        Self { base_url, secret_key }
    }
}
