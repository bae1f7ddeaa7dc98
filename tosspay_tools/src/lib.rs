//! A small client for the Toss Payments confirmation API.
//!
//! The client normalises the provider's wire format behind a stable contract: business-level
//! rejections (declined card, exceeded limit, mismatched amount) come back as ordinary results
//! with `success: false` and a human-readable message. Transport-level failures, where the caller
//! cannot know whether the charge landed, surface as [`TossPayApiError::Unreachable`].
mod api;
mod config;
mod data_objects;
mod error;

pub use api::TossPayApi;
pub use config::TossPayConfig;
pub use data_objects::{CancelResult, ConfirmResult, TossPayment};
pub use error::TossPayApiError;
