//! `SqliteDatabase` is a concrete implementation of a Market Payment Engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use mpg_common::Krw;
use sqlx::SqlitePool;

use super::db::{checkouts, new_pool, orders, products};
use crate::{
    db_types::{
        CheckoutStatus,
        NewCheckout,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        PaymentRecord,
        PaymentStatus,
        PendingCheckout,
        Product,
        ReconciliationGapRecord,
    },
    order_objects::{ModifyProductRequest, OrderQueryFilter, OrderView, SellerStats},
    traits::{
        CatalogManagement,
        CheckoutClaim,
        NewPaymentRecord,
        NewReconciliationGap,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_id(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn update_product(
        &self,
        product_id: i64,
        update: ModifyProductRequest,
    ) -> Result<Product, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        products::update_product(product_id, update, &mut conn)
            .await?
            .ok_or(PaymentGatewayError::ProductNotFound(product_id))
    }

    async fn decrement_stock(&self, product_id: i64, quantity: i64) -> Result<bool, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        products::decrement_stock(product_id, quantity, &mut conn).await
    }

    async fn products_for_seller(&self, seller_id: &str) -> Result<Vec<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = products::products_for_seller(seller_id, &mut conn).await?;
        Ok(result)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn order_view(&self, order_id: &OrderId) -> Result<Option<OrderView>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order_by_order_id(order_id, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::item_views(order_id, &mut conn).await?;
        Ok(Some(OrderView::from_parts(order, items)))
    }

    async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().with_customer_id(customer_id);
        let order_rows = orders::search_orders(query, &mut conn).await?;
        let mut views = Vec::with_capacity(order_rows.len());
        for order in order_rows {
            let items = orders::item_views(&order.order_id, &mut conn).await?;
            views.push(OrderView::from_parts(order, items));
        }
        Ok(views)
    }

    async fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<OrderView>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order_rows = orders::orders_for_seller(seller_id, &mut conn).await?;
        let mut views = Vec::with_capacity(order_rows.len());
        for order in order_rows {
            let items = orders::item_views(&order.order_id, &mut conn).await?;
            views.push(OrderView::from_parts(order, items));
        }
        Ok(views)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(query, &mut conn).await?;
        Ok(result)
    }

    async fn seller_stats(&self, seller_id: &str) -> Result<SellerStats, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let status_counts = orders::seller_status_counts(seller_id, &mut conn).await?;
        let total_orders = status_counts.iter().map(|c| c.count).sum();
        let total_revenue = orders::seller_revenue(seller_id, &mut conn).await?;
        let (product_count, out_of_stock_count) = products::catalog_counts_for_seller(seller_id, &mut conn).await?;
        Ok(SellerStats {
            seller_id: seller_id.to_string(),
            total_orders,
            total_revenue,
            status_counts,
            product_count,
            out_of_stock_count,
        })
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// The whole operation runs inside one transaction. Any early return drops the transaction,
    /// which rolls back every stock decrement and insert made so far, so a failed order leaves
    /// no trace.
    async fn create_order(&self, order: NewOrder, enforce_total: Option<Krw>) -> Result<OrderView, PaymentGatewayError> {
        if order.items.is_empty() {
            return Err(PaymentGatewayError::EmptyOrder);
        }
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order_by_order_id(&order.order_id, &mut tx).await?.is_some() {
            return Err(PaymentGatewayError::OrderAlreadyExists(order.order_id));
        }
        let mut total = Krw::default();
        let mut priced_items = Vec::with_capacity(order.items.len());
        for entry in &order.items {
            if entry.quantity <= 0 {
                return Err(PaymentGatewayError::InvalidQuantity {
                    product_id: entry.product_id,
                    quantity: entry.quantity,
                });
            }
            let product = products::fetch_product_by_id(entry.product_id, &mut tx)
                .await?
                .ok_or(PaymentGatewayError::ProductNotFound(entry.product_id))?;
            if let Some(displayed) = entry.unit_price {
                if displayed != product.unit_price {
                    warn!(
                        "🗃️ Order [{}]: storefront displayed {displayed} for product {} but the catalog price is {}. \
                         Using the catalog price.",
                        order.order_id, product.id, product.unit_price
                    );
                }
            }
            let decremented = products::decrement_stock(entry.product_id, entry.quantity, &mut tx).await?;
            if !decremented {
                return Err(PaymentGatewayError::InsufficientStock {
                    product_id: product.id,
                    title: product.title,
                    requested: entry.quantity,
                    available: product.stock,
                });
            }
            total += product.unit_price * entry.quantity;
            priced_items.push((product.id, entry.quantity, product.unit_price));
        }
        if let Some(expected) = enforce_total {
            if expected != total {
                return Err(PaymentGatewayError::TotalMismatch { expected, computed: total });
            }
        }
        if let Some(claimed) = order.claimed_total {
            if claimed != total {
                warn!(
                    "🗃️ Order [{}]: client claimed a total of {claimed} but the catalog total is {total}. Using the \
                     catalog total.",
                    order.order_id
                );
            }
        }
        let db_order = orders::insert_order(
            &order.order_id,
            &order.customer_id,
            total,
            OrderStatusType::Paid,
            order.created_at,
            &mut tx,
        )
        .await?;
        for (product_id, quantity, unit_price) in priced_items {
            orders::insert_order_item(&order.order_id, product_id, quantity, unit_price, &mut tx).await?;
        }
        let items = orders::item_views(&order.order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] saved with id {}. Total: {total}", db_order.order_id, db_order.id);
        Ok(OrderView::from_parts(db_order, items))
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        seller_id: &str,
    ) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order_by_order_id(order_id, &mut tx).await?.is_none() {
            return Err(PaymentGatewayError::OrderNotFound(order_id.clone()));
        }
        if !orders::seller_owns_order(order_id, seller_id, &mut tx).await? {
            return Err(PaymentGatewayError::NotSellerOrder {
                order_id: order_id.clone(),
                seller_id: seller_id.to_string(),
            });
        }
        let order = orders::update_order_status(order_id, status, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order [{order_id}] status set to {status} by seller {seller_id}");
        Ok(order)
    }

    async fn insert_checkout(&self, checkout: NewCheckout) -> Result<PendingCheckout, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        checkouts::insert_checkout(checkout, &mut conn).await
    }

    async fn fetch_checkout(&self, checkout_id: &str) -> Result<Option<PendingCheckout>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let pending = checkouts::fetch_checkout(checkout_id, &mut conn).await?;
        Ok(pending)
    }

    async fn claim_checkout(&self, checkout_id: &str) -> Result<CheckoutClaim, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(pending) = checkouts::claim_checkout(checkout_id, &mut conn).await? {
            trace!("🗃️ Checkout [{checkout_id}] claimed for confirmation");
            return Ok(CheckoutClaim::Claimed(pending));
        }
        match checkouts::fetch_checkout(checkout_id, &mut conn).await? {
            Some(pending) => Ok(CheckoutClaim::AlreadyProcessed(pending.status)),
            None => Ok(CheckoutClaim::NotFound),
        }
    }

    async fn set_checkout_status(&self, checkout_id: &str, status: CheckoutStatus) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        checkouts::set_checkout_status(checkout_id, status, &mut conn).await
    }

    async fn upsert_payment(&self, payment: NewPaymentRecord) -> Result<(PaymentRecord, bool), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let result = checkouts::idempotent_insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn update_payment_status(
        &self,
        payment_key: &str,
        status: PaymentStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<PaymentRecord, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        checkouts::update_payment_status(payment_key, status, approved_at, &mut conn).await
    }

    async fn link_payment_to_order(&self, payment_key: &str, order_id: &OrderId) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        checkouts::link_payment_to_order(payment_key, order_id, &mut conn).await
    }

    async fn fetch_payment_by_key(&self, payment_key: &str) -> Result<Option<PaymentRecord>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let record = checkouts::fetch_payment_by_key(payment_key, &mut conn).await?;
        Ok(record)
    }

    async fn record_gap(&self, gap: NewReconciliationGap) -> Result<ReconciliationGapRecord, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        checkouts::insert_gap(gap, &mut conn).await
    }

    async fn unresolved_gaps(&self) -> Result<Vec<ReconciliationGapRecord>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let gaps = checkouts::unresolved_gaps(&mut conn).await?;
        Ok(gaps)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
