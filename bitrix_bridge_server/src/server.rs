use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use bitrix_tools::BitrixApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    event_log::FileEventLog,
    middleware::ShopifyHmacFactory,
    routes::{health, method_not_allowed, shopify_webhook},
};

/// Webhook bodies above this size are rejected before deserialization. Shopify order payloads
/// are comfortably below it.
pub const MAX_WEBHOOK_BODY_SIZE: usize = 1024 * 1024;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let api = BitrixApi::new(config.bitrix.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, api)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, api: BitrixApi) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let event_log = FileEventLog::new(config.event_log_path.clone());
        let hmac = ShopifyHmacFactory::new(config.shopify.hmac_secret.clone(), config.shopify.hmac_checks);
        let webhook_scope = web::scope("/webhook").wrap(hmac).service(
            web::resource("/orders")
                .route(web::post().to(shopify_webhook::<BitrixApi, FileEventLog>))
                .route(web::route().to(method_not_allowed)),
        );
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sbb::access_log"))
            .app_data(web::JsonConfig::default().limit(MAX_WEBHOOK_BODY_SIZE))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(event_log))
            .app_data(web::Data::new(config.mapping.clone()))
            .service(health)
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
