use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use market_payment_engine::{
    db_types::{CartEntry, CheckoutStatus, GapReason, NewProduct, OrderId, PaymentStatus, Product},
    order_objects::ModifyProductRequest,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{
        CatalogManagement,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentProvider,
        ProviderConfirmation,
        ProviderError,
    },
    ReconcileOutcome,
    ReconciliationApi,
    SqliteDatabase,
};
use mpg_common::Krw;

/// A scripted provider. Responses are served in order; once the script runs dry every further
/// confirmation is approved.
#[derive(Clone, Default)]
struct StubProvider {
    responses: Arc<Mutex<VecDeque<Result<ProviderConfirmation, ProviderError>>>>,
    calls: Arc<AtomicUsize>,
}

impl StubProvider {
    fn approving() -> Self {
        Self::default()
    }

    fn scripted(response: Result<ProviderConfirmation, ProviderError>) -> Self {
        let stub = Self::default();
        stub.responses.lock().unwrap().push_back(response);
        stub
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentProvider for StubProvider {
    async fn confirm(
        &self,
        _payment_key: &str,
        _checkout_id: &str,
        _amount: Krw,
    ) -> Result<ProviderConfirmation, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or(Ok(ProviderConfirmation::Approved { approved_at: None }))
    }
}

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn seed_product(db: &SqliteDatabase, price: i64, stock: i64) -> Product {
    db.insert_product(NewProduct {
        title: "정기배송 원두".to_string(),
        unit_price: Krw::from(price),
        stock,
        seller_id: "seller-1".to_string(),
        brand: Some("브루웍스".to_string()),
        image_url: None,
    })
    .await
    .expect("Error inserting product")
}

fn cart(product_id: i64, quantity: i64) -> Vec<CartEntry> {
    vec![CartEntry { product_id, quantity, unit_price: None }]
}

#[tokio::test]
async fn confirmed_checkout_becomes_a_durable_order() {
    let db = new_db().await;
    let product = seed_product(&db, 1000, 5).await;
    let api = ReconciliationApi::new(db.clone(), StubProvider::approving());

    let pending = api
        .begin_checkout(Some("cust-100".to_string()), cart(product.id, 2), Krw::from(2000))
        .await
        .expect("Error starting checkout");
    let outcome =
        api.confirm_checkout("pk-1", &pending.checkout_id, Krw::from(2000)).await.expect("Error confirming");

    let view = match outcome {
        ReconcileOutcome::OrderCreated(view) => view,
        other => panic!("Expected OrderCreated, got {other:?}"),
    };
    assert_eq!(view.order_id.as_str(), pending.checkout_id);
    assert_eq!(view.total_price, Krw::from(2000));
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().stock, 3);

    let payment = db.fetch_payment_by_key("pk-1").await.unwrap().expect("Payment record missing");
    assert_eq!(payment.status, PaymentStatus::Confirmed);
    assert_eq!(payment.order_id.as_ref().map(|o| o.as_str()), Some(pending.checkout_id.as_str()));
    assert_eq!(payment.amount, Krw::from(2000));

    let checkout = db.fetch_checkout(&pending.checkout_id).await.unwrap().unwrap();
    assert_eq!(checkout.status, CheckoutStatus::OrderCreated);
}

#[tokio::test]
async fn repeated_redirects_confirm_at_most_once() {
    let db = new_db().await;
    let product = seed_product(&db, 1000, 5).await;
    let provider = StubProvider::approving();
    let api = ReconciliationApi::new(db.clone(), provider.clone());

    let pending = api
        .begin_checkout(Some("cust-100".to_string()), cart(product.id, 1), Krw::from(1000))
        .await
        .expect("Error starting checkout");

    let first = api.confirm_checkout("pk-dup", &pending.checkout_id, Krw::from(1000)).await.unwrap();
    assert!(matches!(first, ReconcileOutcome::OrderCreated(_)));

    // A rendering framework re-fires the redirect effect with identical parameters.
    let second = api.confirm_checkout("pk-dup", &pending.checkout_id, Krw::from(1000)).await.unwrap();
    assert!(matches!(second, ReconcileOutcome::AlreadyProcessed { .. }));

    assert_eq!(provider.call_count(), 1, "The provider must only be asked to confirm once");
    let orders = db.orders_for_customer("cust-100").await.unwrap();
    assert_eq!(orders.len(), 1, "A duplicate confirm must not create a second order");
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().stock, 4);
}

#[tokio::test]
async fn missing_buyer_reports_payment_without_creating_an_order() {
    let db = new_db().await;
    let product = seed_product(&db, 1000, 5).await;
    let api = ReconciliationApi::new(db.clone(), StubProvider::approving());

    // The session was lost across the redirect; the checkout carries no buyer identity.
    let pending =
        api.begin_checkout(None, cart(product.id, 1), Krw::from(1000)).await.expect("Error starting checkout");
    let outcome = api.confirm_checkout("pk-2", &pending.checkout_id, Krw::from(1000)).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::ConfirmedWithoutOrder { .. }));
    // The payment itself succeeded and is recorded as such.
    let payment = db.fetch_payment_by_key("pk-2").await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Confirmed);
    // No order was created with a guessed identity, and nothing was taken from stock.
    assert!(db.fetch_order(&OrderId::from(pending.checkout_id.clone())).await.unwrap().is_none());
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().stock, 5);

    let gaps = api.unresolved_gaps().await.unwrap();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].reason, GapReason::MissingBuyer);
    assert_eq!(gaps[0].payment_key, "pk-2");
    assert_eq!(db.fetch_checkout(&pending.checkout_id).await.unwrap().unwrap().status, CheckoutStatus::Gap);
}

#[tokio::test]
async fn decline_is_a_result_not_a_fault() {
    let db = new_db().await;
    let product = seed_product(&db, 1000, 5).await;
    let provider = StubProvider::scripted(Ok(ProviderConfirmation::Declined {
        message: "토스페이먼츠 결제 승인 실패: 카드 한도 초과".to_string(),
    }));
    let api = ReconciliationApi::new(db.clone(), provider);

    let pending = api
        .begin_checkout(Some("cust-100".to_string()), cart(product.id, 1), Krw::from(1000))
        .await
        .expect("Error starting checkout");
    let outcome = api.confirm_checkout("pk-3", &pending.checkout_id, Krw::from(1000)).await.unwrap();

    match outcome {
        ReconcileOutcome::Declined { message } => assert!(message.contains("카드 한도 초과")),
        other => panic!("Expected Declined, got {other:?}"),
    }
    assert_eq!(db.fetch_payment_by_key("pk-3").await.unwrap().unwrap().status, PaymentStatus::Failed);
    assert_eq!(db.fetch_checkout(&pending.checkout_id).await.unwrap().unwrap().status, CheckoutStatus::Failed);
    assert!(db.fetch_order(&OrderId::from(pending.checkout_id.clone())).await.unwrap().is_none());
    assert!(api.unresolved_gaps().await.unwrap().is_empty(), "A decline is not a reconciliation gap");
}

#[tokio::test]
async fn unreachable_provider_leaves_the_outcome_unknown() {
    let db = new_db().await;
    let product = seed_product(&db, 1000, 5).await;
    let provider = StubProvider::scripted(Err(ProviderError::Unreachable("connection refused".to_string())));
    let api = ReconciliationApi::new(db.clone(), provider.clone());

    let pending = api
        .begin_checkout(Some("cust-100".to_string()), cart(product.id, 1), Krw::from(1000))
        .await
        .expect("Error starting checkout");
    let outcome = api.confirm_checkout("pk-4", &pending.checkout_id, Krw::from(1000)).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::PaymentPendingUnknown { .. }));
    // The charge may or may not have landed; nothing is assumed and no order exists.
    assert!(db.fetch_order(&OrderId::from(pending.checkout_id.clone())).await.unwrap().is_none());
    assert_eq!(db.fetch_checkout(&pending.checkout_id).await.unwrap().unwrap().status, CheckoutStatus::Confirming);

    // The claim stands, so nothing re-fires the confirmation automatically.
    let retry = api.confirm_checkout("pk-4", &pending.checkout_id, Krw::from(1000)).await.unwrap();
    assert!(matches!(retry, ReconcileOutcome::AlreadyProcessed { .. }));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn amount_mismatch_fails_before_the_provider_is_called() {
    let db = new_db().await;
    let product = seed_product(&db, 1000, 5).await;
    let provider = StubProvider::approving();
    let api = ReconciliationApi::new(db.clone(), provider.clone());

    let pending = api
        .begin_checkout(Some("cust-100".to_string()), cart(product.id, 2), Krw::from(2000))
        .await
        .expect("Error starting checkout");
    // The redirect carries a tampered amount.
    let outcome = api.confirm_checkout("pk-5", &pending.checkout_id, Krw::from(500)).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Declined { .. }));
    assert_eq!(provider.call_count(), 0, "A tampered amount must never reach the provider");
    assert_eq!(db.fetch_checkout(&pending.checkout_id).await.unwrap().unwrap().status, CheckoutStatus::Failed);
}

#[tokio::test]
async fn order_failure_after_capture_is_a_recorded_gap() {
    let db = new_db().await;
    // Stock runs out between checkout initiation and the redirect.
    let product = seed_product(&db, 1000, 1).await;
    let api = ReconciliationApi::new(db.clone(), StubProvider::approving());

    let pending = api
        .begin_checkout(Some("cust-100".to_string()), cart(product.id, 3), Krw::from(3000))
        .await
        .expect("Error starting checkout");
    let outcome = api.confirm_checkout("pk-6", &pending.checkout_id, Krw::from(3000)).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::ConfirmedWithoutOrder { .. }));
    // The buyer has been charged; this is a gap, not a payment failure.
    assert_eq!(db.fetch_payment_by_key("pk-6").await.unwrap().unwrap().status, PaymentStatus::Confirmed);
    let gaps = api.unresolved_gaps().await.unwrap();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].reason, GapReason::OrderCreationFailed);
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().stock, 1);
}

#[tokio::test]
async fn price_drift_after_capture_is_an_amount_mismatch_gap() {
    let db = new_db().await;
    let product = seed_product(&db, 1000, 5).await;
    let api = ReconciliationApi::new(db.clone(), StubProvider::approving());

    let pending = api
        .begin_checkout(Some("cust-100".to_string()), cart(product.id, 2), Krw::from(2000))
        .await
        .expect("Error starting checkout");

    // The seller raises the price while the buyer sits on the payment widget.
    let update = ModifyProductRequest { new_unit_price: Some(Krw::from(1500)), ..Default::default() };
    db.update_product(product.id, update).await.expect("Error updating product");

    let outcome = api.confirm_checkout("pk-7", &pending.checkout_id, Krw::from(2000)).await.unwrap();
    assert!(matches!(outcome, ReconcileOutcome::ConfirmedWithoutOrder { .. }));
    let gaps = api.unresolved_gaps().await.unwrap();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].reason, GapReason::AmountMismatch);
    // The charged amount was never turned into an order at the wrong total.
    assert!(db.fetch_order(&OrderId::from(pending.checkout_id.clone())).await.unwrap().is_none());
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().stock, 5);
}
