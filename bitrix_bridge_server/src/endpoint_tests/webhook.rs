use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use bitrix_tools::{BitrixApiError, DealSummary, ProductRow};
use bridge_common::Cents;
use serde_json::{json, Value};

use super::mocks::{MockCrm, MockEventLog};
use crate::{
    config::MappingConfig,
    routes::{method_not_allowed, shopify_webhook, TOPIC_HEADER},
};

fn mapping() -> MappingConfig {
    let mut mapping = MappingConfig::default();
    mapping.sku_to_product_id.insert("ALB0002".to_string(), 101);
    mapping
}

fn quiet_event_log() -> MockEventLog {
    let mut event_log = MockEventLog::new();
    event_log.expect_record().returning(|_, _| Ok(()));
    event_log
}

async fn send(method: TestRequest, crm: MockCrm, event_log: MockEventLog) -> (StatusCode, String) {
    let app = App::new()
        .app_data(web::Data::new(crm))
        .app_data(web::Data::new(event_log))
        .app_data(web::Data::new(mapping()))
        .service(
            web::resource("/webhook/orders")
                .route(web::post().to(shopify_webhook::<MockCrm, MockEventLog>))
                .route(web::route().to(method_not_allowed)),
        );
    let service = test::init_service(app).await;
    let res = test::call_service(&service, method.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

async fn post_webhook(topic: &str, order: Value, crm: MockCrm, event_log: MockEventLog) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/webhook/orders").insert_header((TOPIC_HEADER, topic)).set_json(order);
    send(req, crm, event_log).await
}

#[actix_web::test]
async fn order_created_creates_a_deal_with_product_rows() {
    let _ = env_logger::try_init().ok();
    let order = json!({
        "id": 123,
        "name": "#1001",
        "financial_status": "paid",
        "line_items": [{"sku": "ALB0002", "quantity": 2, "price": "10.00"}],
    });
    let mut crm = MockCrm::new();
    crm.expect_upsert_contact().returning(|_| Ok(55));
    crm.expect_add_deal()
        .withf(|fields| {
            fields.stage_id.as_deref() == Some("C2:WON") &&
                fields.payment_status.map(|s| s.to_string()).as_deref() == Some("PAID") &&
                fields.shopify_order_id.as_deref() == Some("123") &&
                fields.contact_id == Some(55)
        })
        .returning(|_| Ok(421));
    crm.expect_set_product_rows()
        .withf(|deal_id, rows| {
            *deal_id == 421 && rows == &[ProductRow { product_id: 101, quantity: 2, price: Cents::new(1000) }]
        })
        .returning(|_, _| Ok(()));
    let (status, body) = post_webhook("orders/create", order, crm, quiet_event_log()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn unhandled_topics_are_acknowledged_without_crm_calls() {
    let _ = env_logger::try_init().ok();
    let order = json!({"id": 123, "name": "#1001"});
    // No expectations: any CRM call would panic the test.
    let (status, body) = post_webhook("orders/delete", order, MockCrm::new(), quiet_event_log()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn non_post_methods_are_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/webhook/orders");
    let (status, _) = send(req, MockCrm::new(), quiet_event_log()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn update_without_a_matching_deal_is_a_no_op() {
    let _ = env_logger::try_init().ok();
    let order = json!({"id": 999, "financial_status": "paid", "current_total_price": "100.00"});
    let mut crm = MockCrm::new();
    crm.expect_find_deal_by_order_id().withf(|id| id == "999").returning(|_| Ok(None));
    // No update/set_product_rows expectations: a mutating call would panic the test.
    let (status, body) = post_webhook("orders/updated", order, crm, quiet_event_log()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn unchanged_amount_is_omitted_from_the_update() {
    let _ = env_logger::try_init().ok();
    let order = json!({
        "id": 123,
        "financial_status": "pending",
        "current_total_price": "100.00",
        "line_items": [{"sku": "ALB0002", "quantity": 1, "price": "100.00"}],
    });
    let mut crm = MockCrm::new();
    crm.expect_find_deal_by_order_id().returning(|_| {
        Ok(Some(DealSummary { id: 9, opportunity: Cents::new(10000), stage_id: "C2:NEW".to_string() }))
    });
    crm.expect_update_deal()
        .withf(|deal_id, fields| {
            *deal_id == 9 &&
                fields.opportunity.is_none() &&
                fields.payment_status.map(|s| s.to_string()).as_deref() == Some("NOT_PAID") &&
                fields.stage_id.as_deref() == Some("C2:PREPARATION")
        })
        .returning(|_, _| Ok(()));
    crm.expect_set_product_rows().returning(|_, _| Ok(()));
    let (status, body) = post_webhook("orders/updated", order, crm, quiet_event_log()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn changed_amount_is_included_in_the_update() {
    let _ = env_logger::try_init().ok();
    let order = json!({"id": 123, "financial_status": "paid", "current_total_price": "150.00"});
    let mut crm = MockCrm::new();
    crm.expect_find_deal_by_order_id().returning(|_| {
        Ok(Some(DealSummary { id: 9, opportunity: Cents::new(10000), stage_id: "C2:NEW".to_string() }))
    });
    crm.expect_update_deal()
        .withf(|_, fields| fields.opportunity == Some(Cents::new(15000)))
        .returning(|_, _| Ok(()));
    // The order has no line items left, so the rows are explicitly cleared.
    crm.expect_set_product_rows().withf(|deal_id, rows| *deal_id == 9 && rows.is_empty()).returning(|_, _| Ok(()));
    let (status, body) = post_webhook("orders/updated", order, crm, quiet_event_log()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn contact_upsert_failure_does_not_block_deal_creation() {
    let _ = env_logger::try_init().ok();
    let order = json!({"id": 123, "financial_status": "paid", "total_price": "20.00"});
    let mut crm = MockCrm::new();
    crm.expect_upsert_contact().returning(|_| Err(BitrixApiError::EmptyResponse));
    crm.expect_add_deal().withf(|fields| fields.contact_id.is_none()).returning(|_| Ok(7));
    let (status, body) = post_webhook("orders/create", order, crm, quiet_event_log()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn product_row_failure_does_not_undo_the_create() {
    let _ = env_logger::try_init().ok();
    let order = json!({
        "id": 123,
        "financial_status": "paid",
        "total_price": "20.00",
        "line_items": [{"sku": "ALB0002", "quantity": 1, "price": "20.00"}],
    });
    let mut crm = MockCrm::new();
    crm.expect_upsert_contact().returning(|_| Ok(55));
    crm.expect_add_deal().returning(|_| Ok(7));
    crm.expect_set_product_rows()
        .returning(|_, _| Err(BitrixApiError::QueryError { status: 500, message: "boom".to_string() }));
    let (status, body) = post_webhook("orders/create", order, crm, quiet_event_log()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn failed_deal_creation_is_reported_as_an_error() {
    let _ = env_logger::try_init().ok();
    let order = json!({"id": 123, "financial_status": "paid", "total_price": "20.00"});
    let mut crm = MockCrm::new();
    crm.expect_upsert_contact().returning(|_| Ok(55));
    crm.expect_add_deal().returning(|_| Err(BitrixApiError::EmptyResponse));
    let (status, body) = post_webhook("orders/create", order, crm, quiet_event_log()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "ERROR");
}

#[actix_web::test]
async fn event_journal_failure_does_not_block_processing() {
    let _ = env_logger::try_init().ok();
    let order = json!({"id": 123, "financial_status": "paid", "total_price": "20.00"});
    let mut event_log = MockEventLog::new();
    event_log
        .expect_record()
        .withf(|topic, _| topic == "orders/create")
        .returning(|_, _| Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into()));
    let mut crm = MockCrm::new();
    crm.expect_upsert_contact().returning(|_| Ok(55));
    crm.expect_add_deal().returning(|_| Ok(7));
    let (status, body) = post_webhook("orders/create", order, crm, event_log).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
