use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use market_payment_engine::{CatalogApi, OrderFlowApi, OrderQueryApi, ReconciliationApi, SqliteDatabase};
use tosspay_tools::TossPayApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::tosspay::TossGateway,
    routes::{
        cancel_payment,
        health,
        payment_status,
        BeginCheckoutRoute,
        ConfirmPaymentRoute,
        CreateOrderRoute,
        CreateProductRoute,
        ListGapsRoute,
        OrderByIdRoute,
        OrdersForCustomerRoute,
        ProductByIdRoute,
        SellerOrdersRoute,
        SellerProductsRoute,
        SellerStatsRoute,
        UpdateOrderStatusRoute,
        UpdateProductRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let tosspay_api =
        TossPayApi::new(config.tosspay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = HttpServer::new(move || {
        let provider = TossGateway::new(tosspay_api.clone());
        let orders_api = OrderFlowApi::new(db.clone());
        let order_query_api = OrderQueryApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let reconciliation_api = ReconciliationApi::new(db.clone(), provider);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mpg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(order_query_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(tosspay_api.clone()))
            .service(health)
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrdersForCustomerRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(BeginCheckoutRoute::<SqliteDatabase, TossGateway>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase, TossGateway>::new())
            .service(ListGapsRoute::<SqliteDatabase, TossGateway>::new())
            .service(payment_status)
            .service(cancel_payment)
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(SellerOrdersRoute::<SqliteDatabase>::new())
            .service(SellerStatsRoute::<SqliteDatabase>::new())
            .service(SellerProductsRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
