use bitrix_tools::{DealFields, NewContact, ProductRow};
use bridge_common::Cents;

use crate::{config::MappingConfig, errors::OrderConversionError, shopify_order::ShopifyOrder};

/// Translate a Shopify order into Bitrix deal fields plus the deal's full product-row set.
///
/// Pure and deterministic: no I/O, no clock, no randomness, so the same order always yields the
/// same output. An empty row list is meaningful — it tells the caller to clear the deal's rows,
/// not to skip the sync.
pub fn map_order_to_deal(
    order: &ShopifyOrder,
    mapping: &MappingConfig,
) -> Result<(DealFields, Vec<ProductRow>), OrderConversionError> {
    let financial_status = order.financial_status.as_deref();
    let opportunity = parse_money(order.current_total_price.as_deref().or(order.total_price.as_deref()).unwrap_or("0"))?;
    let total_discount = order.current_total_discounts.as_deref().map(parse_money).transpose()?;
    let total_tax = order.current_total_tax.as_deref().map(parse_money).transpose()?;

    let fields = DealFields {
        title: Some(order.display_name()),
        category_id: Some(mapping.category_id),
        stage_id: Some(mapping.stage_for(financial_status).to_string()),
        opportunity: Some(opportunity),
        contact_id: None,
        source_id: mapping.source_id_for(&order.source_name),
        shopify_order_id: Some(order.id.to_string()),
        payment_status: Some(mapping.payment_status_for(financial_status)),
        total_discount,
        total_tax,
    };

    let mut rows = Vec::with_capacity(order.line_items.len() + 1);
    for item in &order.line_items {
        rows.push(ProductRow {
            product_id: mapping.product_id_for_sku(item.sku.as_deref()),
            quantity: item.quantity,
            price: parse_money(&item.price)?,
        });
    }
    let shipping: Cents = order
        .shipping_lines
        .iter()
        .map(|line| parse_money(&line.price))
        .collect::<Result<Vec<Cents>, _>>()?
        .into_iter()
        .sum();
    if !shipping.is_zero() {
        if let Some(product_id) = mapping.shipping_product_id {
            rows.push(ProductRow { product_id, quantity: 1, price: shipping });
        }
        // No shipping product configured: the charge is simply not represented on the deal.
    }
    Ok((fields, rows))
}

/// Contact details for the CRM contact upsert, taken from the customer block when present and
/// falling back to the order-level email.
pub fn contact_from_order(order: &ShopifyOrder) -> NewContact {
    let customer = order.customer.clone().unwrap_or_default();
    NewContact {
        first_name: customer.first_name.unwrap_or_default(),
        last_name: customer.last_name.unwrap_or_default(),
        email: customer.email.or_else(|| order.email.clone()),
        phone: customer.phone,
    }
}

fn parse_money(s: &str) -> Result<Cents, OrderConversionError> {
    s.parse::<Cents>().map_err(|e| OrderConversionError(e.to_string()))
}
