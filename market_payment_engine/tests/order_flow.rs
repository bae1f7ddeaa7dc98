use chrono::{TimeZone, Utc};
use market_payment_engine::{
    db_types::{CartEntry, NewOrder, NewProduct, OrderStatusType, Product},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CatalogManagement, OrderManagement, PaymentGatewayError},
    OrderFlowApi,
    SqliteDatabase,
};
use mpg_common::Krw;

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn seed_product(db: &SqliteDatabase, title: &str, price: i64, stock: i64, seller: &str) -> Product {
    db.insert_product(NewProduct {
        title: title.to_string(),
        unit_price: Krw::from(price),
        stock,
        seller_id: seller.to_string(),
        brand: Some("마켓브랜드".to_string()),
        image_url: Some(format!("https://img.example.com/{title}.jpg")),
    })
    .await
    .expect("Error inserting product")
}

fn entry(product_id: i64, quantity: i64) -> CartEntry {
    CartEntry { product_id, quantity, unit_price: None }
}

#[tokio::test]
async fn order_captures_prices_and_decrements_stock() {
    let db = new_db().await;
    let product = seed_product(&db, "보온 텀블러", 1000, 5, "seller-1").await;
    let api = OrderFlowApi::new(db.clone());

    let order = NewOrder::new("cust-100".to_string(), vec![entry(product.id, 2)]);
    let view = api.create_order(order).await.expect("Error creating order");

    assert_eq!(view.total_price, Krw::from(2000));
    assert_eq!(view.status, OrderStatusType::Paid);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.items[0].unit_price, Krw::from(1000));
    assert_eq!(view.items[0].title, "보온 텀블러");
    assert_eq!(view.items[0].seller_id, "seller-1");

    let product = db.fetch_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 3);
}

#[tokio::test]
async fn failed_order_leaves_no_trace() {
    let db = new_db().await;
    let product = seed_product(&db, "핸드크림", 8000, 5, "seller-1").await;
    let api = OrderFlowApi::new(db.clone());

    let order = NewOrder::new("cust-100".to_string(), vec![entry(product.id, 2), entry(99_999, 1)]);
    let order_id = order.order_id.clone();
    let err = api.create_order(order).await.expect_err("Order should have failed");
    assert!(matches!(err, PaymentGatewayError::ProductNotFound(99_999)));

    // No partial effect: stock untouched, no order or line items persisted.
    let product = db.fetch_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 5);
    assert!(db.fetch_order(&order_id).await.unwrap().is_none());
    assert!(db.fetch_order_items(&order_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn insufficient_stock_identifies_the_offending_product() {
    let db = new_db().await;
    let scarce = seed_product(&db, "한정판 피규어", 50_000, 1, "seller-1").await;
    let plenty = seed_product(&db, "일반 배지", 2000, 10, "seller-1").await;
    let api = OrderFlowApi::new(db.clone());

    let order = NewOrder::new("cust-100".to_string(), vec![entry(plenty.id, 1), entry(scarce.id, 2)]);
    let err = api.create_order(order).await.expect_err("Order should have failed");
    match err {
        PaymentGatewayError::InsufficientStock { product_id, requested, available, .. } => {
            assert_eq!(product_id, scarce.id);
            assert_eq!(requested, 2);
            assert_eq!(available, 1);
        },
        other => panic!("Expected InsufficientStock, got {other}"),
    }
    // The whole order aborted, including the line that had enough stock.
    assert_eq!(db.fetch_product(plenty.id).await.unwrap().unwrap().stock, 10);
    assert_eq!(db.fetch_product(scarce.id).await.unwrap().unwrap().stock, 1);
}

#[tokio::test]
async fn line_item_price_survives_catalog_edits() {
    let db = new_db().await;
    let product = seed_product(&db, "유리컵", 3000, 10, "seller-1").await;
    let api = OrderFlowApi::new(db.clone());

    let order = NewOrder::new("cust-100".to_string(), vec![entry(product.id, 1)]);
    let view = api.create_order(order).await.expect("Error creating order");

    let update = market_payment_engine::order_objects::ModifyProductRequest {
        new_unit_price: Some(Krw::from(4500)),
        ..Default::default()
    };
    db.update_product(product.id, update).await.expect("Error updating product");

    let after = api.order_by_id(&view.order_id).await.expect("Error fetching order");
    assert_eq!(after.items[0].unit_price, Krw::from(3000));
    assert_eq!(after.total_price, Krw::from(3000));
}

#[tokio::test]
async fn customer_orders_are_newest_first() {
    let db = new_db().await;
    let product = seed_product(&db, "노트", 1500, 100, "seller-1").await;
    let api = OrderFlowApi::new(db.clone());

    for day in [3, 1, 7, 5] {
        let mut order = NewOrder::new("cust-100".to_string(), vec![entry(product.id, 1)]);
        order.created_at = Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap();
        api.create_order(order).await.expect("Error creating order");
    }

    let orders = db.orders_for_customer("cust-100").await.expect("Error fetching orders");
    assert_eq!(orders.len(), 4);
    for pair in orders.windows(2) {
        assert!(pair[0].created_at > pair[1].created_at, "Orders are not strictly newest-first");
    }
}

#[tokio::test]
async fn status_updates_are_seller_scoped() {
    let db = new_db().await;
    let product = seed_product(&db, "머그컵", 7000, 10, "seller-1").await;
    let api = OrderFlowApi::new(db.clone());

    let order = NewOrder::new("cust-100".to_string(), vec![entry(product.id, 1)]);
    let view = api.create_order(order).await.expect("Error creating order");

    let err = api
        .update_status_for_seller(&view.order_id, OrderStatusType::Shipping, "seller-2")
        .await
        .expect_err("A foreign seller must not update the order");
    assert!(matches!(err, PaymentGatewayError::NotSellerOrder { .. }));

    // The legacy console sends the Korean label; it canonicalises to Shipping.
    let status: OrderStatusType = "배송중".parse().unwrap();
    let updated = api
        .update_status_for_seller(&view.order_id, status, "seller-1")
        .await
        .expect("The owning seller must be able to update the order");
    assert_eq!(updated.status, OrderStatusType::Shipping);
}

#[tokio::test]
async fn empty_orders_are_rejected() {
    let db = new_db().await;
    let api = OrderFlowApi::new(db.clone());
    let order = NewOrder::new("cust-100".to_string(), vec![]);
    let err = api.create_order(order).await.expect_err("Empty order should fail");
    assert!(matches!(err, PaymentGatewayError::EmptyOrder));
}

#[tokio::test]
async fn client_claimed_totals_are_recomputed() {
    let db = new_db().await;
    let product = seed_product(&db, "접시 세트", 12_000, 4, "seller-1").await;
    let api = OrderFlowApi::new(db.clone());

    // The storefront claims a stale total; the stored order carries the catalog total.
    let order = NewOrder::new("cust-100".to_string(), vec![entry(product.id, 2)]).with_claimed_total(Krw::from(100));
    let view = api.create_order(order).await.expect("Error creating order");
    assert_eq!(view.total_price, Krw::from(24_000));
}

#[tokio::test]
async fn duplicate_order_ids_are_rejected() {
    let db = new_db().await;
    let product = seed_product(&db, "달력", 9000, 10, "seller-1").await;
    let api = OrderFlowApi::new(db.clone());

    let order = NewOrder::new("cust-100".to_string(), vec![entry(product.id, 1)]);
    let order_id = order.order_id.clone();
    api.create_order(order).await.expect("Error creating order");

    let dup = NewOrder::new("cust-200".to_string(), vec![entry(product.id, 1)]).with_order_id(order_id);
    let err = api.create_order(dup).await.expect_err("Duplicate order id should fail");
    assert!(matches!(err, PaymentGatewayError::OrderAlreadyExists(_)));
    // The duplicate attempt must not have eaten stock.
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().stock, 9);
}
