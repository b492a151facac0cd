mod hmac;

pub use hmac::{ShopifyHmacFactory, ShopifyHmacService, SHOPIFY_HMAC_HEADER};
