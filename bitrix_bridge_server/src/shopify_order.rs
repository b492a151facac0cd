use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// The slice of a Shopify order webhook payload this bridge reads. Everything else in the
/// (large) payload is ignored by serde.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShopifyOrder {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub financial_status: Option<String>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub source_name: String,
    pub total_price: Option<String>,
    pub current_total_price: Option<String>,
    pub current_total_discounts: Option<String>,
    pub current_total_tax: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
    pub email: Option<String>,
    pub customer: Option<Customer>,
}

impl ShopifyOrder {
    /// The order's display name, falling back to the numeric id for logs and deal titles.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Shopify order {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LineItem {
    pub sku: Option<String>,
    #[serde(default)]
    pub title: String,
    pub quantity: i64,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShippingLine {
    #[serde(default)]
    pub title: String,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Customer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Builds order payloads for tests without hand-writing JSON everywhere.
#[derive(Debug, Clone, Default)]
pub struct OrderBuilder {
    id: Option<i64>,
    name: Option<String>,
    financial_status: Option<String>,
    currency: Option<String>,
    source_name: Option<String>,
    total_price: Option<String>,
    current_total_price: Option<String>,
    current_total_discounts: Option<String>,
    current_total_tax: Option<String>,
    line_items: Vec<LineItem>,
    shipping_lines: Vec<ShippingLine>,
    email: Option<String>,
    customer: Option<Customer>,
}

impl OrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn financial_status(mut self, status: &str) -> Self {
        self.financial_status = Some(status.to_string());
        self
    }

    pub fn source_name(mut self, source_name: &str) -> Self {
        self.source_name = Some(source_name.to_string());
        self
    }

    pub fn total_price(mut self, price: &str) -> Self {
        self.total_price = Some(price.to_string());
        self
    }

    pub fn current_total_price(mut self, price: &str) -> Self {
        self.current_total_price = Some(price.to_string());
        self
    }

    pub fn current_total_discounts(mut self, discounts: &str) -> Self {
        self.current_total_discounts = Some(discounts.to_string());
        self
    }

    pub fn current_total_tax(mut self, tax: &str) -> Self {
        self.current_total_tax = Some(tax.to_string());
        self
    }

    pub fn line_item(mut self, sku: Option<&str>, quantity: i64, price: &str) -> Self {
        self.line_items.push(LineItem {
            sku: sku.map(str::to_string),
            title: String::default(),
            quantity,
            price: price.to_string(),
        });
        self
    }

    pub fn shipping(mut self, price: &str) -> Self {
        self.shipping_lines.push(ShippingLine { title: "Standard".to_string(), price: price.to_string() });
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn customer(mut self, customer: Customer) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn build(self) -> ShopifyOrder {
        let mut rng = rand::thread_rng();
        #[allow(clippy::cast_possible_wrap)]
        let id = self.id.unwrap_or((rng.next_u64() >> 1) as i64);
        ShopifyOrder {
            id,
            name: self.name.unwrap_or_else(|| format!("#{}", rng.gen_range(1000..10_000))),
            financial_status: self.financial_status,
            currency: self.currency.unwrap_or_else(|| "USD".to_string()),
            source_name: self.source_name.unwrap_or_else(|| "web".to_string()),
            total_price: self.total_price,
            current_total_price: self.current_total_price,
            current_total_discounts: self.current_total_discounts,
            current_total_tax: self.current_total_tax,
            line_items: self.line_items,
            shipping_lines: self.shipping_lines,
            email: self.email,
            customer: self.customer,
        }
    }
}
