use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Compute the base64 HMAC-SHA256 signature Shopify attaches to webhook deliveries in the
/// `X-Shopify-Hmac-Sha256` header.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC-SHA256 accepts keys of any length, so this cannot fail.
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::default(),
    };
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}
