use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use market_payment_engine::{
    db_types::{
        CartEntry,
        CheckoutStatus,
        GapReason,
        OrderId,
        OrderStatusType,
        PaymentRecord,
        PaymentStatus,
        PendingCheckout,
        ReconciliationGapRecord,
    },
    order_objects::OrderView,
    traits::CheckoutClaim,
    ReconciliationApi,
};
use mpg_common::Krw;
use serde_json::json;

use super::{
    helpers::post_request,
    mocks::{MockGatewayDb, StubProvider},
};
use crate::routes::ConfirmPaymentRoute;

fn pending_checkout(checkout_id: &str, customer_id: Option<&str>) -> PendingCheckout {
    let items = vec![CartEntry { product_id: 1, quantity: 1, unit_price: None }];
    PendingCheckout {
        id: 1,
        checkout_id: checkout_id.to_string(),
        customer_id: customer_id.map(str::to_string),
        items_json: serde_json::to_string(&items).unwrap(),
        claimed_total: Krw::from(1000),
        status: CheckoutStatus::Confirming,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn payment_record(payment_key: &str, checkout_id: &str) -> PaymentRecord {
    PaymentRecord {
        id: 1,
        payment_key: payment_key.to_string(),
        checkout_id: checkout_id.to_string(),
        order_id: None,
        amount: Krw::from(1000),
        status: PaymentStatus::Initiated,
        approved_at: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn order_view(order_id: &str) -> OrderView {
    OrderView {
        order_id: OrderId::from(order_id),
        customer_id: "cust-100".to_string(),
        status: OrderStatusType::Paid,
        total_price: Krw::from(1000),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        items: vec![],
    }
}

fn confirm_payload() -> serde_json::Value {
    json!({ "paymentKey": "pk-1", "orderId": "chk-1", "amount": 1000 })
}

#[actix_web::test]
async fn confirmed_redirect_creates_the_order() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_claim_checkout().returning(|id| Ok(CheckoutClaim::Claimed(pending_checkout(id, Some("cust-100")))));
        db.expect_upsert_payment().returning(|p| Ok((payment_record(&p.payment_key, &p.checkout_id), true)));
        db.expect_update_payment_status().returning(|key, _, _| Ok(payment_record(key, "chk-1")));
        db.expect_set_checkout_status().times(2).returning(|_, _| Ok(()));
        db.expect_create_order().returning(|order, _| Ok(order_view(order.order_id.as_str())));
        db.expect_link_payment_to_order().returning(|_, _| Ok(()));
        let api = ReconciliationApi::new(db, StubProvider::Approving);
        cfg.service(ConfirmPaymentRoute::<MockGatewayDb, StubProvider>::new()).app_data(web::Data::new(api));
    };
    let (status, body) = post_request("/payments/confirm", confirm_payload(), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["orderId"], json!("chk-1"));
}

#[actix_web::test]
async fn missing_buyer_yields_202_payment_received() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_claim_checkout().returning(|id| Ok(CheckoutClaim::Claimed(pending_checkout(id, None))));
        db.expect_upsert_payment().returning(|p| Ok((payment_record(&p.payment_key, &p.checkout_id), true)));
        db.expect_update_payment_status().returning(|key, _, _| Ok(payment_record(key, "chk-1")));
        db.expect_set_checkout_status().times(2).returning(|_, _| Ok(()));
        db.expect_record_gap().returning(|gap| {
            Ok(ReconciliationGapRecord {
                id: 11,
                checkout_id: gap.checkout_id,
                payment_key: gap.payment_key,
                amount: gap.amount,
                reason: GapReason::MissingBuyer,
                detail: gap.detail,
                resolved: false,
                created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            })
        });
        let api = ReconciliationApi::new(db, StubProvider::Approving);
        cfg.service(ConfirmPaymentRoute::<MockGatewayDb, StubProvider>::new()).app_data(web::Data::new(api));
    };
    let (status, body) = post_request("/payments/confirm", confirm_payload(), configure).await;
    // Payment success is reported, but as "order pending review", never as a plain success.
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], json!(true));
    assert!(body["message"].as_str().unwrap().contains("결제는 정상적으로 완료"));
}

#[actix_web::test]
async fn duplicate_redirects_are_acknowledged_without_confirming() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_claim_checkout().returning(|_| Ok(CheckoutClaim::AlreadyProcessed(CheckoutStatus::OrderCreated)));
        // StubProvider::Untouchable panics if the handler reaches the provider.
        let api = ReconciliationApi::new(db, StubProvider::Untouchable);
        cfg.service(ConfirmPaymentRoute::<MockGatewayDb, StubProvider>::new()).app_data(web::Data::new(api));
    };
    let (status, body) = post_request("/payments/confirm", confirm_payload(), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["message"].as_str().unwrap().contains("이미 처리된 결제"));
}

#[actix_web::test]
async fn declines_map_to_success_false_not_an_error_status() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_claim_checkout().returning(|id| Ok(CheckoutClaim::Claimed(pending_checkout(id, Some("cust-100")))));
        db.expect_upsert_payment().returning(|p| Ok((payment_record(&p.payment_key, &p.checkout_id), true)));
        db.expect_update_payment_status().returning(|key, _, _| Ok(payment_record(key, "chk-1")));
        db.expect_set_checkout_status().returning(|_, _| Ok(()));
        let api = ReconciliationApi::new(db, StubProvider::Declining);
        cfg.service(ConfirmPaymentRoute::<MockGatewayDb, StubProvider>::new()).app_data(web::Data::new(api));
    };
    let (status, body) = post_request("/payments/confirm", confirm_payload(), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("카드 한도 초과"));
}

#[actix_web::test]
async fn unreachable_provider_maps_to_retry_safe_503() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_claim_checkout().returning(|id| Ok(CheckoutClaim::Claimed(pending_checkout(id, Some("cust-100")))));
        db.expect_upsert_payment().returning(|p| Ok((payment_record(&p.payment_key, &p.checkout_id), true)));
        let api = ReconciliationApi::new(db, StubProvider::Unreachable);
        cfg.service(ConfirmPaymentRoute::<MockGatewayDb, StubProvider>::new()).app_data(web::Data::new(api));
    };
    let (status, body) = post_request("/payments/confirm", confirm_payload(), configure).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("결제 상태를 조회"));
}

#[actix_web::test]
async fn unknown_checkout_tokens_are_404() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockGatewayDb::new();
        db.expect_claim_checkout().returning(|_| Ok(CheckoutClaim::NotFound));
        let api = ReconciliationApi::new(db, StubProvider::Untouchable);
        cfg.service(ConfirmPaymentRoute::<MockGatewayDb, StubProvider>::new()).app_data(web::Data::new(api));
    };
    let (status, body) = post_request("/payments/confirm", confirm_payload(), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}
