//! The deal synchronizer: the create and update sequences against the CRM.
//!
//! Each flow is a strictly linear sequence of awaited CRM calls with per-step fatality. The only
//! step that may abort a flow is one that invalidates its purpose (the deal-creation call, the
//! deal lookup/update). Everything else is best-effort: executed through [`log_and_continue`],
//! which downgrades the failure to a warning and keeps going.

use bitrix_tools::{CrmOperations, DealFields};
use log::*;

use crate::{
    config::MappingConfig,
    errors::SyncError,
    integrations::bitrix::{contact_from_order, map_order_to_deal},
    shopify_order::ShopifyOrder,
};

/// Run a best-effort step: log the failure and carry on without it.
fn log_and_continue<T, E: std::fmt::Display>(step: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{step} failed (non-blocking). {e}");
            None
        },
    }
}

/// Handle `orders/create`: create a deal for the order and return its id.
///
/// There is no duplicate detection here. A redelivered create event will create a second deal;
/// the `UF_SHOPIFY_ORDER_ID` lookup in [`handle_order_updated`] is the only idempotency
/// mechanism in the bridge.
pub async fn handle_order_created<B: CrmOperations>(
    order: &ShopifyOrder,
    api: &B,
    mapping: &MappingConfig,
) -> Result<i64, SyncError> {
    info!("Handling order created: {}", order.display_name());
    let (mut fields, rows) = map_order_to_deal(order, mapping)?;

    let contact = contact_from_order(order);
    if let Some(contact_id) = log_and_continue("Contact upsert", api.upsert_contact(contact).await) {
        fields.contact_id = Some(contact_id);
    }

    // The deal must exist for anything else to matter, so this error propagates.
    let deal_id = api.add_deal(fields).await?;
    info!("Deal created: {deal_id} for order {}", order.display_name());

    if !rows.is_empty() {
        let count = rows.len();
        if log_and_continue("Setting product rows", api.set_product_rows(deal_id, rows).await).is_some() {
            info!("Product rows set for deal {deal_id}: {count} rows");
        }
    }
    Ok(deal_id)
}

/// Handle `orders/updated`: locate the deal via its order-id field and bring its amount, payment
/// status, stage, totals and product rows in line with the order.
///
/// Returns `Ok(None)` when no deal matches the order; an update for an unknown order is a benign
/// no-op, not an error.
///
/// The stage is overwritten from the financial status on every update, even if the deal was
/// manually moved to another stage in the CRM in the meantime. That matches the system this
/// bridge replaces; see DESIGN.md before changing it.
pub async fn handle_order_updated<B: CrmOperations>(
    order: &ShopifyOrder,
    api: &B,
    mapping: &MappingConfig,
) -> Result<Option<i64>, SyncError> {
    info!("Handling order updated: {}", order.display_name());
    let order_id = order.id.to_string();

    let Some(deal) = api.find_deal_by_order_id(&order_id).await? else {
        info!("Deal not found for Shopify order {order_id}. Nothing to update.");
        return Ok(None);
    };
    let deal_id = deal.id;
    debug!("Found deal {deal_id} for order {order_id}");

    let (mapped, rows) = map_order_to_deal(order, mapping)?;
    let fields = DealFields {
        // Only send the amount when it actually changed, to avoid spurious writes.
        opportunity: mapped.opportunity.filter(|amount| *amount != deal.opportunity),
        // Payment status is always re-derived and sent.
        payment_status: mapped.payment_status,
        stage_id: mapped.stage_id,
        total_discount: mapped.total_discount,
        total_tax: mapped.total_tax,
        ..Default::default()
    };

    if fields.is_empty() {
        debug!("No fields to update for deal {deal_id}");
    } else {
        api.update_deal(deal_id, fields).await?;
        info!("Deal {deal_id} updated");
    }

    // Full replacement, including an explicit clear when the order has no rows left.
    let count = rows.len();
    if log_and_continue("Updating product rows", api.set_product_rows(deal_id, rows).await).is_some() {
        match count {
            0 => info!("Product rows cleared for deal {deal_id}"),
            n => info!("Product rows updated for deal {deal_id}: {n} rows"),
        }
    }
    Ok(Some(deal_id))
}
