use std::fmt::Display;

use bridge_common::Cents;
use serde::{de, Deserialize, Deserializer, Serialize};

/// The envelope every Bitrix REST method answers with. Errors are reported in-band via the
/// `error`/`error_description` pair, alongside a 2xx status more often than not.
#[derive(Debug, Clone, Deserialize)]
pub struct BitrixResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Values of the `UF_CRM_PAYMENT_STATUS` user field on a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    NotPaid,
    Refunded,
    Voided,
    PartiallyPaid,
    PartiallyRefunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Paid => "PAID",
            Self::NotPaid => "NOT_PAID",
            Self::Refunded => "REFUNDED",
            Self::Voided => "VOIDED",
            Self::PartiallyPaid => "PARTIALLY_PAID",
            Self::PartiallyRefunded => "PARTIALLY_REFUNDED",
        };
        f.write_str(s)
    }
}

/// A sparse set of deal fields for `crm.deal.add` / `crm.deal.update`.
///
/// Every member is optional; unset members are left off the wire entirely, which is what makes
/// the update flow's "only send what changed" contract possible.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DealFields {
    #[serde(rename = "TITLE", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "CATEGORY_ID", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(rename = "STAGE_ID", skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<String>,
    #[serde(rename = "OPPORTUNITY", skip_serializing_if = "Option::is_none")]
    pub opportunity: Option<Cents>,
    #[serde(rename = "CONTACT_ID", skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<i64>,
    #[serde(rename = "SOURCE_ID", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Shopify order id, stored on the deal as the idempotency key for later lookups.
    #[serde(rename = "UF_SHOPIFY_ORDER_ID", skip_serializing_if = "Option::is_none")]
    pub shopify_order_id: Option<String>,
    #[serde(rename = "UF_CRM_PAYMENT_STATUS", skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(rename = "UF_SHOPIFY_TOTAL_DISCOUNT", skip_serializing_if = "Option::is_none")]
    pub total_discount: Option<Cents>,
    #[serde(rename = "UF_SHOPIFY_TOTAL_TAX", skip_serializing_if = "Option::is_none")]
    pub total_tax: Option<Cents>,
}

impl DealFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() &&
            self.category_id.is_none() &&
            self.stage_id.is_none() &&
            self.opportunity.is_none() &&
            self.contact_id.is_none() &&
            self.source_id.is_none() &&
            self.shopify_order_id.is_none() &&
            self.payment_status.is_none() &&
            self.total_discount.is_none() &&
            self.total_tax.is_none()
    }
}

/// One line of a deal's product table (`crm.deal.productrows.set`). A deal's rows are always
/// replaced as a full set; an empty set clears the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    #[serde(rename = "PRODUCT_ID")]
    pub product_id: i64,
    #[serde(rename = "QUANTITY")]
    pub quantity: i64,
    #[serde(rename = "PRICE")]
    pub price: Cents,
}

/// The projection of a deal returned by `crm.deal.list`. Bitrix serializes the numeric fields
/// as strings on reads.
#[derive(Debug, Clone, Deserialize)]
pub struct DealSummary {
    #[serde(rename = "ID", deserialize_with = "i64_from_string_or_number")]
    pub id: i64,
    #[serde(rename = "OPPORTUNITY")]
    pub opportunity: Cents,
    #[serde(rename = "STAGE_ID")]
    pub stage_id: String,
}

/// Contact details extracted from an order, for `crm.contact.add` / `crm.contact.list`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub(crate) fn i64_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(de::Error::custom),
    }
}
