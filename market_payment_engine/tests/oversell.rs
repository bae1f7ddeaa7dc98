use market_payment_engine::{
    db_types::{CartEntry, NewOrder, NewProduct},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CatalogManagement, PaymentGatewayError},
    OrderFlowApi,
    SqliteDatabase,
};
use mpg_common::Krw;

// A single pooled connection: concurrent order attempts contend for the same writer, exactly as
// they contend for the row in production, and the guarded decrement arbitrates.
async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database")
}

#[tokio::test]
async fn the_last_unit_cannot_be_sold_twice() {
    let db = new_db().await;
    let product = db
        .insert_product(NewProduct {
            title: "마지막 재고".to_string(),
            unit_price: Krw::from(10_000),
            stock: 1,
            seller_id: "seller-1".to_string(),
            brand: None,
            image_url: None,
        })
        .await
        .expect("Error inserting product");

    let api_a = OrderFlowApi::new(db.clone());
    let api_b = OrderFlowApi::new(db.clone());
    let order_a =
        NewOrder::new("cust-a".to_string(), vec![CartEntry { product_id: product.id, quantity: 1, unit_price: None }]);
    let order_b =
        NewOrder::new("cust-b".to_string(), vec![CartEntry { product_id: product.id, quantity: 1, unit_price: None }]);

    let (result_a, result_b) = tokio::join!(api_a.create_order(order_a), api_b.create_order(order_b));

    let mut wins = 0;
    for result in [result_a, result_b] {
        match result {
            Ok(_) => wins += 1,
            Err(PaymentGatewayError::InsufficientStock { product_id, available, .. }) => {
                assert_eq!(product_id, product.id);
                assert_eq!(available, 0);
            },
            Err(other) => panic!("Loser must fail with InsufficientStock, got {other}"),
        }
    }
    assert_eq!(wins, 1, "Exactly one of the two concurrent orders must succeed");
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().stock, 0);
}

#[tokio::test]
async fn many_concurrent_buyers_never_oversell() {
    let db = new_db().await;
    let product = db
        .insert_product(NewProduct {
            title: "특가 상품".to_string(),
            unit_price: Krw::from(5000),
            stock: 3,
            seller_id: "seller-1".to_string(),
            brand: None,
            image_url: None,
        })
        .await
        .expect("Error inserting product");

    let mut handles = Vec::new();
    for i in 0..5 {
        let api = OrderFlowApi::new(db.clone());
        let order = NewOrder::new(
            format!("cust-{i}"),
            vec![CartEntry { product_id: product.id, quantity: 1, unit_price: None }],
        );
        handles.push(tokio::spawn(async move { api.create_order(order).await }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.expect("Task panicked") {
            Ok(_) => wins += 1,
            Err(PaymentGatewayError::InsufficientStock { .. }) => {},
            Err(other) => panic!("Unexpected failure: {other}"),
        }
    }
    assert_eq!(wins, 3, "Successful decrements must never exceed the starting stock");
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().stock, 0);
}
