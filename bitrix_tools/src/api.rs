use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    config::BitrixConfig,
    data_objects::{BitrixResponse, DealFields, DealSummary, NewContact, ProductRow},
    traits::CrmOperations,
    BitrixApiError,
};

/// A client for the Bitrix24 inbound-webhook REST API.
///
/// Every method is a POST to `{webhook_base}/{method}.json` with a JSON body; the access token
/// is part of the base URL, so no per-request auth headers are needed.
#[derive(Clone)]
pub struct BitrixApi {
    config: BitrixConfig,
    client: Arc<Client>,
}

impl BitrixApi {
    pub fn new(config: BitrixConfig) -> Result<Self, BitrixApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BitrixApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, method: &str) -> String {
        format!("{}/{method}.json", self.config.webhook_base.reveal().trim_end_matches('/'))
    }

    /// Call a Bitrix REST method and unwrap the response envelope.
    ///
    /// A missing `result` is an error: the callers that tolerate an absent record (deal lookup)
    /// get an empty list back instead, so an empty envelope always means the call failed.
    pub async fn rest_call<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, BitrixApiError> {
        let url = self.url(method);
        trace!("Calling Bitrix method {method}");
        let response =
            self.client.post(url).json(body).send().await.map_err(|e| BitrixApiError::RestResponseError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.map_err(|e| BitrixApiError::RestResponseError(e.to_string()))?;
            return Err(BitrixApiError::QueryError { status: status.as_u16(), message });
        }
        let envelope =
            response.json::<BitrixResponse<T>>().await.map_err(|e| BitrixApiError::JsonError(e.to_string()))?;
        if let Some(code) = envelope.error {
            return Err(BitrixApiError::ApiError { code, description: envelope.error_description.unwrap_or_default() });
        }
        envelope.result.ok_or(BitrixApiError::EmptyResponse)
    }
}

impl CrmOperations for BitrixApi {
    async fn add_deal(&self, fields: DealFields) -> Result<i64, BitrixApiError> {
        let deal_id = self.rest_call::<i64, _>("crm.deal.add", &json!({ "fields": fields })).await?;
        debug!("Created deal {deal_id}");
        Ok(deal_id)
    }

    async fn update_deal(&self, deal_id: i64, fields: DealFields) -> Result<(), BitrixApiError> {
        self.rest_call::<bool, _>("crm.deal.update", &json!({ "id": deal_id, "fields": fields })).await?;
        debug!("Updated deal {deal_id}");
        Ok(())
    }

    async fn set_product_rows(&self, deal_id: i64, rows: Vec<ProductRow>) -> Result<(), BitrixApiError> {
        let count = rows.len();
        self.rest_call::<Value, _>("crm.deal.productrows.set", &json!({ "id": deal_id, "rows": rows })).await?;
        debug!("Replaced product rows for deal {deal_id}: {count} rows");
        Ok(())
    }

    async fn find_deal_by_order_id(&self, order_id: &str) -> Result<Option<DealSummary>, BitrixApiError> {
        let body = json!({
            "filter": { "UF_SHOPIFY_ORDER_ID": order_id },
            "select": ["ID", "OPPORTUNITY", "STAGE_ID"],
        });
        let deals = self.rest_call::<Vec<DealSummary>, _>("crm.deal.list", &body).await?;
        Ok(deals.into_iter().next())
    }

    async fn upsert_contact(&self, contact: NewContact) -> Result<i64, BitrixApiError> {
        #[derive(Deserialize)]
        struct ContactSummary {
            #[serde(rename = "ID", deserialize_with = "crate::data_objects::i64_from_string_or_number")]
            id: i64,
        }
        if let Some(email) = &contact.email {
            let body = json!({ "filter": { "EMAIL": email }, "select": ["ID"] });
            let existing = self.rest_call::<Vec<ContactSummary>, _>("crm.contact.list", &body).await?;
            if let Some(found) = existing.first() {
                debug!("Contact already exists for {email}: {}", found.id);
                return Ok(found.id);
            }
        }
        let mut fields = json!({
            "NAME": contact.first_name,
            "LAST_NAME": contact.last_name,
        });
        if let Some(email) = &contact.email {
            fields["EMAIL"] = json!([{ "VALUE": email, "VALUE_TYPE": "WORK" }]);
        }
        if let Some(phone) = &contact.phone {
            fields["PHONE"] = json!([{ "VALUE": phone, "VALUE_TYPE": "WORK" }]);
        }
        let contact_id = self.rest_call::<i64, _>("crm.contact.add", &json!({ "fields": fields })).await?;
        debug!("Created contact {contact_id}");
        Ok(contact_id)
    }
}
