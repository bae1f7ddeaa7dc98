use std::net::{SocketAddr, TcpListener};

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use mpg_common::{Krw, Secret};
use serde_json::{json, Value};
use tosspay_tools::{TossPayApi, TossPayApiError, TossPayConfig};

const TEST_SECRET: &str = "test_sk_demo";

fn api_for(addr: SocketAddr) -> TossPayApi {
    let config = TossPayConfig { base_url: format!("http://{addr}"), secret_key: Secret::new(TEST_SECRET.to_string()) };
    TossPayApi::new(config).expect("Error creating client")
}

fn payment_json(payment_key: &str, order_id: &str, amount: i64) -> Value {
    json!({
        "paymentKey": payment_key,
        "orderId": order_id,
        "totalAmount": amount,
        "status": "DONE",
        "method": "카드",
        "approvedAt": "2024-06-01T12:00:00+09:00",
    })
}

#[actix_web::test]
async fn approved_confirmation_round_trips() {
    let _ = env_logger::try_init().ok();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(|| {
        App::new().route(
            "/payments/confirm",
            web::post().to(|body: web::Json<Value>| async move {
                HttpResponse::Ok().json(payment_json(
                    body["paymentKey"].as_str().unwrap_or_default(),
                    body["orderId"].as_str().unwrap_or_default(),
                    body["amount"].as_i64().unwrap_or_default(),
                ))
            }),
        )
    })
    .listen(listener)
    .unwrap()
    .workers(1)
    .run();
    actix_web::rt::spawn(server);

    let api = api_for(addr);
    let result = api.confirm("pk1", "chk-0001", Krw::from(5000)).await.expect("Confirm should not error");
    assert!(result.success);
    let payment = result.payment.expect("Approved confirmation must carry the payment");
    assert_eq!(payment.payment_key, "pk1");
    assert_eq!(payment.order_id, "chk-0001");
    assert_eq!(payment.total_amount, 5000);
    assert!(payment.approved_at.is_some());
}

#[actix_web::test]
async fn decline_embeds_the_provider_message() {
    let _ = env_logger::try_init().ok();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(|| {
        App::new().route(
            "/payments/confirm",
            web::post().to(|| async {
                HttpResponse::BadRequest().json(json!({
                    "code": "EXCEED_MAX_CARD_LIMIT",
                    "message": "카드 한도 초과",
                }))
            }),
        )
    })
    .listen(listener)
    .unwrap()
    .workers(1)
    .run();
    actix_web::rt::spawn(server);

    let api = api_for(addr);
    let result = api.confirm("pk1", "o1", Krw::from(5000)).await.expect("A decline is a result, not an error");
    assert!(!result.success);
    assert_eq!(result.message, "토스페이먼츠 결제 승인 실패: 카드 한도 초과");
    assert!(result.payment.is_none());
}

#[actix_web::test]
async fn unparseable_error_bodies_fall_back_to_raw_text() {
    let _ = env_logger::try_init().ok();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(|| {
        App::new().route(
            "/payments/confirm",
            web::post().to(|| async { HttpResponse::BadGateway().body("upstream exploded") }),
        )
    })
    .listen(listener)
    .unwrap()
    .workers(1)
    .run();
    actix_web::rt::spawn(server);

    let api = api_for(addr);
    let result = api.confirm("pk1", "o1", Krw::from(5000)).await.expect("Confirm should not error");
    assert!(!result.success);
    assert!(result.message.contains("upstream exploded"));
}

#[actix_web::test]
async fn transport_failure_is_a_distinct_error_kind() {
    let _ = env_logger::try_init().ok();
    // Bind then drop to obtain a port with nothing listening on it.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = api_for(addr);
    let err = api.confirm("pk1", "o1", Krw::from(5000)).await.expect_err("Nothing is listening");
    assert!(matches!(err, TossPayApiError::Unreachable(_)));
}

#[actix_web::test]
async fn status_query_reports_provider_rejection_as_query_error() {
    let _ = env_logger::try_init().ok();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(|| {
        App::new()
            .route("/payments/pk-known", web::get().to(|| async { HttpResponse::Ok().json(payment_json("pk-known", "chk-1", 9900)) }))
            .route(
                "/payments/pk-missing",
                web::get().to(|| async {
                    HttpResponse::NotFound().json(json!({"code": "NOT_FOUND_PAYMENT", "message": "존재하지 않는 결제 입니다."}))
                }),
            )
    })
    .listen(listener)
    .unwrap()
    .workers(1)
    .run();
    actix_web::rt::spawn(server);

    let api = api_for(addr);
    let payment = api.get_status("pk-known").await.expect("Known payment should resolve");
    assert_eq!(payment.total_amount, 9900);

    let err = api.get_status("pk-missing").await.expect_err("Missing payment should be a query error");
    match err {
        TossPayApiError::QueryError { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("존재하지 않는"));
        },
        other => panic!("Expected QueryError, got {other}"),
    }
}

#[actix_web::test]
async fn cancel_omits_amount_for_full_cancellations() {
    let _ = env_logger::try_init().ok();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(|| {
        App::new().route(
            "/payments/{key}/cancel",
            web::post().to(|body: web::Json<Value>| async move {
                // Echo the cancel amount back so the test can see what was sent.
                let amount = body.get("cancelAmount").and_then(Value::as_i64).unwrap_or(-1);
                HttpResponse::Ok().json(payment_json("pk1", "chk-1", amount))
            }),
        )
    })
    .listen(listener)
    .unwrap()
    .workers(1)
    .run();
    actix_web::rt::spawn(server);

    let api = api_for(addr);
    let full = api.cancel("pk1", "구매자 변심", None).await.expect("Cancel should not error");
    assert!(full.success);
    assert_eq!(full.payment.unwrap().total_amount, -1, "Full cancellation must not send a cancelAmount");

    let partial = api.cancel("pk1", "부분 환불", Some(Krw::from(3000))).await.expect("Cancel should not error");
    assert!(partial.success);
    assert_eq!(partial.payment.unwrap().total_amount, 3000);
}

#[actix_web::test]
async fn secret_key_is_sent_as_basic_credential() {
    let _ = env_logger::try_init().ok();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(|| {
        App::new().route(
            "/payments/confirm",
            web::post().to(|req: HttpRequest| async move {
                let expected = format!("Basic {}", base64_of(&format!("{TEST_SECRET}:")));
                let sent = req.headers().get("Authorization").and_then(|v| v.to_str().ok()).unwrap_or_default();
                if sent == expected {
                    HttpResponse::Ok().json(payment_json("pk1", "chk-1", 1000))
                } else {
                    HttpResponse::Unauthorized().json(json!({"code": "UNAUTHORIZED_KEY", "message": "인증되지 않은 시크릿 키입니다."}))
                }
            }),
        )
    })
    .listen(listener)
    .unwrap()
    .workers(1)
    .run();
    actix_web::rt::spawn(server);

    let api = api_for(addr);
    let result = api.confirm("pk1", "chk-1", Krw::from(1000)).await.expect("Confirm should not error");
    assert!(result.success, "The credential must be base64(\"<secret>:\"): {}", result.message);
}

fn base64_of(s: &str) -> String {
    base64::encode(s)
}
