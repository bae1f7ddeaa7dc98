use chrono::{DateTime, Utc};
use log::trace;
use mpg_common::Krw;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Order, OrderId, OrderItem, OrderStatusType},
    order_objects::{OrderItemView, OrderQueryFilter, StatusCount},
    traits::PaymentGatewayError,
};

/// Inserts the order header. This is not atomic on its own; embed the call in a transaction
/// together with the stock decrements and line-item inserts and pass `&mut tx` as the connection.
pub async fn insert_order(
    order_id: &OrderId,
    customer_id: &str,
    total_price: Krw,
    status: OrderStatusType,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                total_price,
                status,
                created_at
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(customer_id)
    .bind(total_price)
    .bind(status.to_string())
    .bind(created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// Inserts one line item with the unit price captured from the catalog at order time.
pub async fn insert_order_item(
    order_id: &OrderId,
    product_id: i64,
    quantity: i64,
    unit_price: Krw,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, PaymentGatewayError> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Line items joined with the catalog for display: title, image and brand come from the product;
/// quantity and unit price come from the line item (the captured price, not the live one).
pub async fn item_views(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItemView>, sqlx::Error> {
    let items = sqlx::query_as(
        r#"
        SELECT
            order_items.product_id AS product_id,
            products.title AS title,
            order_items.quantity AS quantity,
            order_items.unit_price AS unit_price,
            products.image_url AS image_url,
            products.brand AS brand,
            products.seller_id AS seller_id
        FROM order_items JOIN products ON products.id = order_items.product_id
        WHERE order_items.order_id = $1
        ORDER BY order_items.id
        "#,
    )
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in descending order (newest first).
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.0);
    }
    if let Some(customer_id) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

/// Orders that contain at least one line item belonging to one of the seller's products,
/// newest first.
pub async fn orders_for_seller(
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
        SELECT DISTINCT
            orders.id AS id,
            orders.order_id AS order_id,
            orders.customer_id AS customer_id,
            orders.total_price AS total_price,
            orders.status AS status,
            orders.created_at AS created_at,
            orders.updated_at AS updated_at
        FROM orders
            JOIN order_items ON order_items.order_id = orders.order_id
            JOIN products ON products.id = order_items.product_id
        WHERE products.seller_id = $1
        ORDER BY orders.created_at DESC, orders.id DESC
        "#,
    )
    .bind(seller_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Whether the order contains at least one line item for a product owned by the seller. This is
/// the authorization predicate for seller-side status changes.
pub async fn seller_owns_order(
    order_id: &OrderId,
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let exists: (i64,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM order_items JOIN products ON products.id = order_items.product_id
            WHERE order_items.order_id = $1 AND products.seller_id = $2
        )
        "#,
    )
    .bind(order_id.as_str())
    .bind(seller_id)
    .fetch_one(conn)
    .await?;
    Ok(exists.0 != 0)
}

pub(crate) async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentGatewayError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Distinct orders per status for the seller's dashboard.
pub(crate) async fn seller_status_counts(
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<StatusCount>, sqlx::Error> {
    let counts = sqlx::query_as(
        r#"
        SELECT orders.status AS status, COUNT(DISTINCT orders.order_id) AS count
        FROM orders
            JOIN order_items ON order_items.order_id = orders.order_id
            JOIN products ON products.id = order_items.product_id
        WHERE products.seller_id = $1
        GROUP BY orders.status
        "#,
    )
    .bind(seller_id)
    .fetch_all(conn)
    .await?;
    Ok(counts)
}

/// Revenue over the seller's line items, excluding cancelled and returned orders.
pub(crate) async fn seller_revenue(seller_id: &str, conn: &mut SqliteConnection) -> Result<Krw, sqlx::Error> {
    let revenue: (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(order_items.quantity * order_items.unit_price), 0)
        FROM order_items
            JOIN products ON products.id = order_items.product_id
            JOIN orders ON orders.order_id = order_items.order_id
        WHERE products.seller_id = $1 AND orders.status NOT IN ('Cancelled', 'Returned')
        "#,
    )
    .bind(seller_id)
    .fetch_one(conn)
    .await?;
    Ok(Krw::from(revenue.0))
}
