use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use market_payment_engine::{
    db_types::{OrderId, OrderStatusType},
    order_objects::{OrderItemView, OrderView},
    traits::PaymentGatewayError,
    OrderFlowApi,
    OrderQueryApi,
};
use mpg_common::Krw;
use serde_json::json;

use super::{
    helpers::{get_request, patch_request, post_request},
    mocks::{MockGatewayDb, MockOrderDb},
};
use crate::routes::{CreateOrderRoute, OrderByIdRoute, OrdersForCustomerRoute, UpdateOrderStatusRoute};

fn order_view(order_id: &str) -> OrderView {
    OrderView {
        order_id: OrderId::from(order_id),
        customer_id: "cust-100".to_string(),
        status: OrderStatusType::Paid,
        total_price: Krw::from(2000),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        items: vec![OrderItemView {
            product_id: 1,
            title: "보온 텀블러".to_string(),
            quantity: 2,
            unit_price: Krw::from(1000),
            image_url: Some("https://img.example.com/tumbler.jpg".to_string()),
            brand: Some("마켓브랜드".to_string()),
            seller_id: "seller-1".to_string(),
        }],
    }
}

#[actix_web::test]
async fn fetch_order_expands_line_items() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockOrderDb::new();
        db.expect_order_view().returning(|_| Ok(Some(order_view("ord-1"))));
        cfg.service(OrderByIdRoute::<MockOrderDb>::new()).app_data(web::Data::new(OrderQueryApi::new(db)));
    };
    let (status, body) = get_request("/orders/ord-1", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["orderId"], json!("ord-1"));
    assert_eq!(body["data"]["totalPrice"], json!(2000));
    assert_eq!(body["data"]["items"][0]["title"], json!("보온 텀블러"));
    assert_eq!(body["data"]["items"][0]["brand"], json!("마켓브랜드"));
}

#[actix_web::test]
async fn missing_order_is_a_404_with_message() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockOrderDb::new();
        db.expect_order_view().returning(|_| Ok(None));
        cfg.service(OrderByIdRoute::<MockOrderDb>::new()).app_data(web::Data::new(OrderQueryApi::new(db)));
    };
    let (status, body) = get_request("/orders/ord-missing", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("ord-missing"));
}

#[actix_web::test]
async fn customer_history_is_returned_as_a_list() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockOrderDb::new();
        db.expect_orders_for_customer()
            .returning(|_| Ok(vec![order_view("ord-2"), order_view("ord-1")]));
        cfg.service(OrdersForCustomerRoute::<MockOrderDb>::new()).app_data(web::Data::new(OrderQueryApi::new(db)));
    };
    let (status, body) = get_request("/orders/user/cust-100", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["orderId"], json!("ord-2"));
}

#[actix_web::test]
async fn create_order_returns_the_normalized_view() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_create_order().returning(|order, _| {
            let mut view = order_view(order.order_id.as_str());
            view.customer_id = order.customer_id;
            Ok(view)
        });
        cfg.service(CreateOrderRoute::<MockGatewayDb>::new()).app_data(web::Data::new(OrderFlowApi::new(db)));
    };
    let payload = json!({
        "customerId": "cust-100",
        "items": [{ "productId": 1, "quantity": 2, "unitPrice": 1000 }],
        "totalPrice": 2000,
    });
    let (status, body) = post_request("/orders", payload, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["customerId"], json!("cust-100"));
    assert_eq!(body["data"]["totalPrice"], json!(2000));
}

#[actix_web::test]
async fn stock_conflicts_surface_as_409_with_the_product_named() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_create_order().returning(|_, _| {
            Err(PaymentGatewayError::InsufficientStock {
                product_id: 7,
                title: "한정판 피규어".to_string(),
                requested: 2,
                available: 1,
            })
        });
        cfg.service(CreateOrderRoute::<MockGatewayDb>::new()).app_data(web::Data::new(OrderFlowApi::new(db)));
    };
    let payload = json!({
        "customerId": "cust-100",
        "items": [{ "productId": 7, "quantity": 2 }],
    });
    let (status, body) = post_request("/orders", payload, configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("한정판 피규어"), "The buyer must see which product ran out: {message}");
}

#[actix_web::test]
async fn unknown_status_strings_are_rejected_before_the_engine() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        // No expectations: the handler must reject the status before touching the backend.
        let db = MockGatewayDb::new();
        cfg.service(UpdateOrderStatusRoute::<MockGatewayDb>::new()).app_data(web::Data::new(OrderFlowApi::new(db)));
    };
    let payload = json!({ "status": "총알배송", "sellerId": "seller-1" });
    let (status, body) = patch_request("/seller/orders/ord-1/status", payload, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn foreign_sellers_cannot_move_an_order() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_update_order_status().returning(|order_id, _, seller_id| {
            Err(PaymentGatewayError::NotSellerOrder { order_id: order_id.clone(), seller_id: seller_id.to_string() })
        });
        cfg.service(UpdateOrderStatusRoute::<MockGatewayDb>::new()).app_data(web::Data::new(OrderFlowApi::new(db)));
    };
    // The legacy console sends the Korean label; it parses, but the scope check rejects the write.
    let payload = json!({ "status": "배송중", "sellerId": "seller-2" });
    let (status, body) = patch_request("/seller/orders/ord-1/status", payload, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));
}
