use std::fmt::Display;

use chrono::{DateTime, Utc};
use mpg_common::Krw;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Order, OrderId, OrderStatusType};

//--------------------------------------      OrderView        -------------------------------------------------------
/// The normalized order representation returned to storefront and back-office clients: the order
/// header plus each line item expanded with product display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: OrderId,
    pub customer_id: String,
    pub status: OrderStatusType,
    pub total_price: Krw,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    pub fn from_parts(order: Order, items: Vec<OrderItemView>) -> Self {
        Self {
            order_id: order.order_id,
            customer_id: order.customer_id,
            status: order.status,
            total_price: order.total_price,
            created_at: order.created_at,
            items,
        }
    }
}

//--------------------------------------    OrderItemView      -------------------------------------------------------
/// A line item joined with the product it refers to. `unit_price` and `quantity` come from the
/// line item (captured at order time); title, image and brand come from the catalog.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: i64,
    pub title: String,
    pub quantity: i64,
    pub unit_price: Krw,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub seller_id: String,
}

//--------------------------------------     SellerStats       -------------------------------------------------------
/// Dashboard aggregates for one seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStats {
    pub seller_id: String,
    pub total_orders: i64,
    /// Revenue over the seller's line items, excluding cancelled and returned orders.
    pub total_revenue: Krw,
    pub status_counts: Vec<StatusCount>,
    pub product_count: i64,
    pub out_of_stock_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatusType,
    pub count: i64,
}

//--------------------------------------   OrderQueryFilter    -------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub customer_id: Option<String>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.customer_id.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, "customer_id: {customer_id}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        Ok(())
    }
}

//-------------------------------------- ModifyProductRequest --------------------------------------------------------
/// A partial catalog edit. Only the supplied fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyProductRequest {
    pub new_title: Option<String>,
    pub new_unit_price: Option<Krw>,
    pub new_stock: Option<i64>,
    pub new_brand: Option<String>,
    pub new_image_url: Option<String>,
}

impl ModifyProductRequest {
    pub fn is_empty(&self) -> bool {
        self.new_title.is_none() &&
            self.new_unit_price.is_none() &&
            self.new_stock.is_none() &&
            self.new_brand.is_none() &&
            self.new_image_url.is_none()
    }
}
