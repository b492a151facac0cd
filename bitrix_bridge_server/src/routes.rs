//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go
//! into a separate module (the order flows live in [`crate::sync`]). Keep this module neat and
//! tidy 🙏

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use bitrix_tools::CrmOperations;
use log::*;

use crate::{
    config::MappingConfig,
    event_log::WebhookEventLog,
    shopify_order::ShopifyOrder,
    sync::{handle_order_created, handle_order_updated},
};

pub const TOPIC_HEADER: &str = "X-Shopify-Topic";
pub const TOPIC_ORDER_CREATED: &str = "orders/create";
pub const TOPIC_ORDER_UPDATED: &str = "orders/updated";

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Webhook  ---------------------------------------------------

/// The order webhook dispatcher.
///
/// Reads the event topic from the `X-Shopify-Topic` header and routes the order payload to the
/// create or update flow; any other topic is acknowledged without action, since Shopify retries
/// deliveries that are not answered with a 2xx. The response body is a terse `OK`/`ERROR` — all
/// granular failure handling happens inside the flows.
pub async fn shopify_webhook<B, E>(
    req: HttpRequest,
    body: web::Json<ShopifyOrder>,
    api: web::Data<B>,
    event_log: web::Data<E>,
    mapping: web::Data<MappingConfig>,
) -> HttpResponse
where
    B: CrmOperations + 'static,
    E: WebhookEventLog + 'static,
{
    let topic = req.headers().get(TOPIC_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    let order = body.into_inner();
    trace!("🛍️️ Received webhook delivery. Topic: {topic}, order: {}", order.display_name());

    // Journal the raw event before doing anything with it. Best-effort.
    match serde_json::to_value(&order) {
        Ok(payload) => {
            if let Err(e) = event_log.record(&topic, &payload).await {
                warn!("🛍️️ Could not journal the webhook event (non-blocking). {e}");
            }
        },
        Err(e) => warn!("🛍️️ Could not serialize the webhook event for journalling (non-blocking). {e}"),
    }

    let result = match topic.as_str() {
        TOPIC_ORDER_CREATED => handle_order_created(&order, api.get_ref(), mapping.get_ref()).await.map(|_| ()),
        TOPIC_ORDER_UPDATED => handle_order_updated(&order, api.get_ref(), mapping.get_ref()).await.map(|_| ()),
        other => {
            info!("🛍️️ Unhandled topic: {other}. Acknowledging without action.");
            Ok(())
        },
    };
    match result {
        Ok(()) => HttpResponse::Ok().body("OK"),
        Err(e) => {
            error!("🛍️️ Webhook processing failed for order {}. {e}", order.display_name());
            HttpResponse::InternalServerError().body("ERROR")
        },
    }
}

/// Catch-all for non-POST methods on the webhook resource.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().body("Method not allowed")
}
