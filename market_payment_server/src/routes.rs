//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module
//! neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current
//! thread will stop the worker from processing new requests. For this reason, any long,
//! non-cpu-bound operation (I/O, database queries, provider calls, etc.) must be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads
//! and thus don't block execution.
use std::str::FromStr;

use actix_web::{get, http::StatusCode, post, web, HttpResponse, Responder};
use log::*;
use market_payment_engine::{
    db_types::{NewOrder, NewProduct, OrderId, OrderStatusType},
    order_objects::ModifyProductRequest,
    traits::{CatalogManagement, OrderManagement, PaymentGatewayDatabase, PaymentProvider},
    CatalogApi,
    OrderFlowApi,
    OrderQueryApi,
    ReconcileOutcome,
    ReconciliationApi,
};
use tosspay_tools::{TossPayApi, TossPayApiError};

use crate::{
    data_objects::{
        CancelParams,
        CheckoutCreated,
        CheckoutParams,
        ConfirmParams,
        DataResponse,
        JsonResponse,
        NewOrderParams,
        UpdateStatusParams,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!`
// macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  -----------------------------------------------------------
route!(create_order => Post "/orders" impl PaymentGatewayDatabase);
/// Route handler for creating an order directly from the storefront.
///
/// The claimed total and displayed unit prices are hints; pricing and stock are re-validated
/// against the catalog inside one atomic unit of work, so a failed order leaves no partial state.
pub async fn create_order<B: PaymentGatewayDatabase>(
    params: web::Json<NewOrderParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = params.into_inner();
    debug!("💻️📦️ POST /orders for customer {} with {} line item(s)", params.customer_id, params.items.len());
    let mut order = NewOrder::new(params.customer_id, params.items);
    if let Some(total) = params.total_price {
        order = order.with_claimed_total(total);
    }
    let view = api.create_order(order).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(view)))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️📦️ GET order [{order_id}]");
    let view = api.order_by_id(&order_id).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(view)))
}

route!(orders_for_customer => Get "/orders/user/{customer_id}" impl OrderManagement);
/// The customer's order history, newest first.
pub async fn orders_for_customer<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️📦️ GET orders for customer {customer_id}");
    let orders = api.orders_for_customer(&customer_id).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(orders)))
}

//----------------------------------------------  Checkout  ----------------------------------------------------------
route!(begin_checkout => Post "/checkouts" impl PaymentGatewayDatabase, PaymentProvider);
/// Stashes the cart as a pending checkout and returns the correlation token the storefront must
/// hand to the payment widget as its order id.
pub async fn begin_checkout<B, P>(
    params: web::Json<CheckoutParams>,
    api: web::Data<ReconciliationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    let params = params.into_inner();
    debug!("💻️💳️ POST /checkouts with {} line item(s) for {}", params.items.len(), params.total_price);
    let pending = api
        .begin_checkout(params.customer_id, params.items, params.total_price)
        .await
        .map_err(ServerError::from)?;
    let created = CheckoutCreated { checkout_id: pending.checkout_id, claimed_total: pending.claimed_total };
    Ok(HttpResponse::Ok().json(DataResponse::new(created)))
}

route!(confirm_payment => Post "/payments/confirm" impl PaymentGatewayDatabase, PaymentProvider);
/// Route handler for the payment widget's success redirect.
///
/// The engine claims the checkout before confirming, so re-fired redirects cannot confirm twice
/// or create two orders. Each reconciliation outcome maps to a distinct response: a decline is a
/// normal `success:false` result, an unreachable provider is a retry-safe 503, and a confirmed
/// payment without an order is a 202 that the buyer sees as "payment received, order pending
/// review", never a silent success and never a generic failure.
pub async fn confirm_payment<B, P>(
    params: web::Json<ConfirmParams>,
    api: web::Data<ReconciliationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    let params = params.into_inner();
    debug!("💻️💳️ Payment confirmation redirect for checkout [{}]", params.order_id);
    let outcome =
        api.confirm_checkout(&params.payment_key, &params.order_id, params.amount).await.map_err(ServerError::from)?;
    let response = match outcome {
        ReconcileOutcome::OrderCreated(view) => HttpResponse::Ok().json(DataResponse::new(view)),
        ReconcileOutcome::AlreadyProcessed { checkout_id, status } => HttpResponse::Ok()
            .json(JsonResponse::success(format!("이미 처리된 결제입니다. (주문 {checkout_id}, 상태 {status})"))),
        ReconcileOutcome::Declined { message } => HttpResponse::Ok().json(JsonResponse::failure(message)),
        ReconcileOutcome::PaymentPendingUnknown { message } => {
            HttpResponse::ServiceUnavailable().json(JsonResponse::failure(message))
        },
        ReconcileOutcome::ConfirmedWithoutOrder { message, .. } => {
            HttpResponse::Accepted().json(JsonResponse::success(message))
        },
    };
    Ok(response)
}

route!(list_gaps => Get "/reconciliation/gaps" impl PaymentGatewayDatabase, PaymentProvider);
/// The support queue: payments captured at the provider with no corresponding order.
pub async fn list_gaps<B, P>(api: web::Data<ReconciliationApi<B, P>>) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    let gaps = api.unresolved_gaps().await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(gaps)))
}

//----------------------------------------------  Payments  ----------------------------------------------------------
/// Thin passthrough to the provider's status endpoint. The provider's rejection status and
/// message are forwarded verbatim.
#[get("/payments/status/{payment_key}")]
pub async fn payment_status(
    path: web::Path<String>,
    api: web::Data<TossPayApi>,
) -> Result<HttpResponse, ServerError> {
    let payment_key = path.into_inner();
    trace!("💻️💳️ GET payment status for [{payment_key}]");
    match api.get_status(&payment_key).await {
        Ok(payment) => Ok(HttpResponse::Ok().json(DataResponse::new(payment))),
        Err(TossPayApiError::QueryError { status, message }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok(HttpResponse::build(status).json(JsonResponse::failure(message)))
        },
        Err(e) => Err(ServerError::from(e)),
    }
}

/// Thin passthrough to the provider's cancel endpoint, returning its normalized result verbatim.
/// An omitted `cancelAmount` cancels the payment in full.
#[post("/payments/cancel/{payment_key}")]
pub async fn cancel_payment(
    path: web::Path<String>,
    params: web::Json<CancelParams>,
    api: web::Data<TossPayApi>,
) -> Result<HttpResponse, ServerError> {
    let payment_key = path.into_inner();
    let params = params.into_inner();
    debug!("💻️💳️ POST cancel for payment [{payment_key}]");
    let result = api.cancel(&payment_key, &params.cancel_reason, params.cancel_amount).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Seller  -----------------------------------------------------------
route!(update_order_status => Patch "/seller/orders/{order_id}/status" impl PaymentGatewayDatabase);
/// Seller-scoped status transition. The engine verifies that the order actually contains one of
/// the seller's products before anything is written.
pub async fn update_order_status<B: PaymentGatewayDatabase>(
    path: web::Path<String>,
    params: web::Json<UpdateStatusParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let params = params.into_inner();
    let status = OrderStatusType::from_str(&params.status)
        .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    debug!("💻️📦️ PATCH order [{order_id}] status to {status} for seller {}", params.seller_id);
    let order = api.update_status_for_seller(&order_id, status, &params.seller_id).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(order)))
}

route!(seller_orders => Get "/seller/{seller_id}/orders" impl OrderManagement);
pub async fn seller_orders<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let seller_id = path.into_inner();
    debug!("💻️🧾️ GET orders for seller {seller_id}");
    let orders = api.orders_for_seller(&seller_id).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(orders)))
}

route!(seller_stats => Get "/seller/{seller_id}/stats" impl OrderManagement);
pub async fn seller_stats<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let seller_id = path.into_inner();
    debug!("💻️🧾️ GET dashboard stats for seller {seller_id}");
    let stats = api.seller_stats(&seller_id).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(stats)))
}

route!(seller_products => Get "/seller/{seller_id}/products" impl CatalogManagement);
pub async fn seller_products<B: CatalogManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let seller_id = path.into_inner();
    debug!("💻️🗂️ GET products for seller {seller_id}");
    let products = api.products_for_seller(&seller_id).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(products)))
}

//----------------------------------------------  Catalog  -----------------------------------------------------------
route!(create_product => Post "/products" impl CatalogManagement);
pub async fn create_product<B: CatalogManagement>(
    params: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.add_product(params.into_inner()).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(product)))
}

route!(product_by_id => Get "/products/{product_id}" impl CatalogManagement);
pub async fn product_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.product_by_id(path.into_inner()).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(product)))
}

route!(update_product => Patch "/products/{product_id}" impl CatalogManagement);
/// Price and stock edits. Existing orders are untouched: line items keep the unit price captured
/// when they were created.
pub async fn update_product<B: CatalogManagement>(
    path: web::Path<i64>,
    params: web::Json<ModifyProductRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.update_product(path.into_inner(), params.into_inner()).await.map_err(ServerError::from)?;
    Ok(HttpResponse::Ok().json(DataResponse::new(product)))
}
