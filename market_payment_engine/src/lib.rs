//! Market Payment Engine
//!
//! The Market Payment Engine carries the stateful core of the marketplace: the product catalog,
//! atomic order creation, and the reconciliation of payment-provider confirmations into durable
//! orders. It is storefront-agnostic and provider-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the
//!    database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@mpe_api`]). This provides the public-facing functionality:
//!    order flows, catalog access, back-office queries and payment reconciliation. Specific
//!    backends need to implement the traits in [`mod@traits`] to act as a backend for the Market
//!    Payment Server.
pub mod db_types;
pub mod helpers;
mod mpe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use mpe_api::{
    catalog_api::CatalogApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    order_query_api::OrderQueryApi,
    reconciliation_api::{ReconcileOutcome, ReconciliationApi},
};
