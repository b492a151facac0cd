use crate::{data_objects::{DealFields, DealSummary, NewContact, ProductRow}, BitrixApiError};

/// The CRM operations the bridge's order flows are written against.
///
/// [`crate::BitrixApi`] is the production implementation; tests substitute a mock so that the
/// flows can be exercised without a Bitrix portal.
#[allow(async_fn_in_trait)]
pub trait CrmOperations {
    /// Create a deal and return its Bitrix-assigned id.
    async fn add_deal(&self, fields: DealFields) -> Result<i64, BitrixApiError>;
    /// Apply the given (sparse) field set to an existing deal.
    async fn update_deal(&self, deal_id: i64, fields: DealFields) -> Result<(), BitrixApiError>;
    /// Replace the deal's entire product table. An empty `rows` clears it.
    async fn set_product_rows(&self, deal_id: i64, rows: Vec<ProductRow>) -> Result<(), BitrixApiError>;
    /// Find the deal whose `UF_SHOPIFY_ORDER_ID` equals the given order id.
    async fn find_deal_by_order_id(&self, order_id: &str) -> Result<Option<DealSummary>, BitrixApiError>;
    /// Return the id of an existing contact with the same email, or create one.
    async fn upsert_contact(&self, contact: NewContact) -> Result<i64, BitrixApiError>;
}
