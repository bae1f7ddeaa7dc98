//! # Database management and control.
//!
//! This module defines the interface contracts that engine database *backends* must expose.
//!
//! * [`PaymentGatewayDatabase`] defines the highest level of behaviour: atomic order creation,
//!   checkout claims, payment records and reconciliation gaps.
//! * [`CatalogManagement`] covers the product catalog, including the atomic stock decrement the
//!   order flow relies on.
//! * [`OrderManagement`] provides read-side queries over orders for the storefront and the seller
//!   back office.
//! * [`PaymentProvider`] is the seam to the external payment confirmation service. It is a
//!   *client* contract, not a database one; it lives next to the database traits so the
//!   reconciliation flow can be generic over both.
mod catalog_management;
mod data_objects;
mod order_management;
mod payment_gateway_database;
mod payment_provider;

pub use catalog_management::CatalogManagement;
pub use data_objects::{CheckoutClaim, NewPaymentRecord, NewReconciliationGap};
pub use order_management::OrderManagement;
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use payment_provider::{PaymentProvider, ProviderConfirmation, ProviderError};
