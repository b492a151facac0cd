use bitrix_tools::{BitrixApiError, CrmOperations, DealFields, DealSummary, NewContact, ProductRow};
use mockall::mock;
use serde_json::Value;

use crate::event_log::{EventLogError, WebhookEventLog};

mock! {
    pub Crm {}
    impl CrmOperations for Crm {
        async fn add_deal(&self, fields: DealFields) -> Result<i64, BitrixApiError>;
        async fn update_deal(&self, deal_id: i64, fields: DealFields) -> Result<(), BitrixApiError>;
        async fn set_product_rows(&self, deal_id: i64, rows: Vec<ProductRow>) -> Result<(), BitrixApiError>;
        async fn find_deal_by_order_id(&self, order_id: &str) -> Result<Option<DealSummary>, BitrixApiError>;
        async fn upsert_contact(&self, contact: NewContact) -> Result<i64, BitrixApiError>;
    }
}

mock! {
    pub EventLog {}
    impl WebhookEventLog for EventLog {
        async fn record(&self, topic: &str, payload: &Value) -> Result<(), EventLogError>;
    }
}
