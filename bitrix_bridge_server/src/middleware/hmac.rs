//! Webhook signature middleware.
//!
//! Shopify signs every webhook delivery with the app's signing secret: HMAC-SHA256 over the raw
//! request body, base64-encoded in the `X-Shopify-Hmac-Sha256` header. Wrapping the webhook
//! scope with this middleware rejects deliveries whose signature is missing or wrong before any
//! handler runs.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorUnauthorized},
    web,
    Error,
};
use bridge_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::helpers::calculate_hmac;

pub const SHOPIFY_HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

pub struct ShopifyHmacFactory {
    secret: Secret<String>,
    // If false, the middleware waves every request through without checking the signature.
    enabled: bool,
}

impl ShopifyHmacFactory {
    pub fn new(secret: Secret<String>, enabled: bool) -> Self {
        Self { secret, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ShopifyHmacFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = ShopifyHmacService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ShopifyHmacService {
            secret: self.secret.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct ShopifyHmacService<S> {
    secret: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ShopifyHmacService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            if !enabled {
                trace!("Webhook HMAC checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            // The signature covers the raw body, so it has to be drained here and handed back
            // to the downstream extractors afterwards.
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("Could not read the webhook body for HMAC validation: {e}");
                ErrorBadRequest("Could not read request body.")
            })?;
            let expected = calculate_hmac(&secret, body.as_ref());
            let provided = req.headers().get(SHOPIFY_HMAC_HEADER).ok_or_else(|| {
                warn!("Webhook delivery carried no HMAC signature. Denying access.");
                ErrorUnauthorized("Missing webhook signature.")
            })?;
            if provided == expected.as_str() {
                trace!("Webhook HMAC signature verified");
                req.set_payload(bytes_to_payload(body));
                service.call(req).await
            } else {
                warn!("Webhook delivery carried an invalid HMAC signature. Denying access.");
                Err(ErrorUnauthorized("Invalid webhook signature."))
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}

#[cfg(test)]
mod test {
    use actix_web::{test, test::TestRequest, App, HttpResponse};

    use super::*;

    const SECRET: &str = "hush";

    async fn echo(body: web::Bytes) -> HttpResponse {
        HttpResponse::Ok().body(body)
    }

    fn request(body: &'static [u8]) -> TestRequest {
        TestRequest::post().uri("/hook").set_payload(body)
    }

    async fn call(req: TestRequest, enabled: bool) -> Result<actix_web::dev::ServiceResponse, actix_web::Error> {
        let factory = ShopifyHmacFactory::new(Secret::new(SECRET.to_string()), enabled);
        let app = App::new().wrap(factory).route("/hook", web::post().to(echo));
        let service = test::init_service(app).await;
        test::try_call_service(&service, req.to_request()).await
    }

    #[actix_web::test]
    async fn valid_signatures_are_accepted_and_the_body_survives() {
        let body: &[u8] = br#"{"id":123}"#;
        let sig = calculate_hmac(SECRET, body);
        let res = call(request(body).insert_header((SHOPIFY_HMAC_HEADER, sig)), true).await.unwrap();
        assert!(res.status().is_success());
        let echoed = test::read_body(res).await;
        assert_eq!(echoed.as_ref(), body);
    }

    #[actix_web::test]
    async fn invalid_signatures_are_rejected() {
        let err = call(request(b"{}").insert_header((SHOPIFY_HMAC_HEADER, "bm9wZQ==")), true)
            .await
            .expect_err("forged request should be rejected");
        assert_eq!(err.to_string(), "Invalid webhook signature.");
    }

    #[actix_web::test]
    async fn unsigned_requests_are_rejected() {
        let err = call(request(b"{}"), true).await.expect_err("unsigned request should be rejected");
        assert_eq!(err.to_string(), "Missing webhook signature.");
    }

    #[actix_web::test]
    async fn checks_can_be_disabled() {
        let res = call(request(b"{}"), false).await.unwrap();
        assert!(res.status().is_success());
    }
}
