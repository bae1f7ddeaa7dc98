//! # Market payment engine public API
//!
//! The `mpe_api` module exposes the programmatic API for the Market Payment Engine. The API is
//! modular, so that clients can pick and choose the functionality they need.
//!
//! * [`order_flow_api`] is the primary API for creating orders and moving them through their
//!   lifecycle.
//! * [`order_query_api`] provides read-side queries over orders for buyers and the seller
//!   back office.
//! * [`catalog_api`] provides access to the product catalog.
//! * [`reconciliation_api`] ties payment-provider confirmations back into durable orders.
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a
//! database backend that implements the backend traits the API requires:
//!
//! ```rust,ignore
//! use market_payment_engine::{OrderQueryApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(url, 25).await?;
//! // SqliteDatabase implements OrderManagement
//! let api = OrderQueryApi::new(db);
//! let orders = api.orders_for_customer("cust-1001").await?;
//! ```

pub mod catalog_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;
pub mod reconciliation_api;
