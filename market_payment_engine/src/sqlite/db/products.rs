use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product},
    order_objects::ModifyProductRequest,
    traits::PaymentGatewayError,
};

pub async fn insert_product(
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, PaymentGatewayError> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (
                title,
                unit_price,
                stock,
                seller_id,
                brand,
                image_url
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(product.title)
    .bind(product.unit_price)
    .bind(product.stock)
    .bind(product.seller_id)
    .bind(product.brand)
    .bind(product.image_url)
    .fetch_one(conn)
    .await?;
    debug!("🗂️ Product [{}] inserted with id {}", product.title, product.id);
    Ok(product)
}

pub async fn fetch_product_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

/// Atomically decrements stock for the product, but only if at least `quantity` units remain.
/// The check and the decrement are a single statement, so a concurrent order can never observe
/// (or cause) negative stock. Returns `false` when stock was insufficient.
pub async fn decrement_stock(
    id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, PaymentGatewayError> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND stock >= $1",
    )
    .bind(quantity)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn update_product(
    id: i64,
    update: ModifyProductRequest,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, PaymentGatewayError> {
    if update.is_empty() {
        debug!("🗂️ No fields to update for product {id}. Update request skipped.");
        return fetch_product_by_id(id, conn).await.map_err(PaymentGatewayError::from);
    }
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(title) = update.new_title {
        set_clause.push("title = ");
        set_clause.push_bind_unseparated(title);
    }
    if let Some(unit_price) = update.new_unit_price {
        set_clause.push("unit_price = ");
        set_clause.push_bind_unseparated(unit_price);
    }
    if let Some(stock) = update.new_stock {
        set_clause.push("stock = ");
        set_clause.push_bind_unseparated(stock);
    }
    if let Some(brand) = update.new_brand {
        set_clause.push("brand = ");
        set_clause.push_bind_unseparated(brand);
    }
    if let Some(image_url) = update.new_image_url {
        set_clause.push("image_url = ");
        set_clause.push_bind_unseparated(image_url);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🗂️ Executing query: {}", builder.sql());
    let result =
        builder.build().fetch_optional(conn).await?.map(|row: SqliteRow| Product::from_row(&row)).transpose()?;
    Ok(result)
}

pub async fn products_for_seller(
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products WHERE seller_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(seller_id)
        .fetch_all(conn)
        .await?;
    Ok(products)
}

/// Returns `(product_count, out_of_stock_count)` for the seller's catalog.
pub(crate) async fn catalog_counts_for_seller(
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(i64, i64), sqlx::Error> {
    let counts: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(stock = 0), 0) FROM products WHERE seller_id = $1",
    )
    .bind(seller_id)
    .fetch_one(conn)
    .await?;
    Ok(counts)
}
