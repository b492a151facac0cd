use bridge_common::Secret;
use log::*;

/// Connection settings for a Bitrix24 inbound webhook.
///
/// The webhook base URL embeds the user id and an access token
/// (`https://{portal}.bitrix24.com/rest/{user}/{token}`), so the whole value is treated as a
/// secret.
#[derive(Debug, Clone, Default)]
pub struct BitrixConfig {
    pub webhook_base: Secret<String>,
}

impl BitrixConfig {
    pub fn new_from_env_or_default() -> Self {
        let webhook_base = Secret::new(std::env::var("SBB_BITRIX_WEBHOOK_BASE").unwrap_or_else(|_| {
            error!(
                "SBB_BITRIX_WEBHOOK_BASE is not set. Please set it to the inbound webhook URL for your Bitrix24 \
                 portal. No CRM call will succeed without it."
            );
            "https://example.bitrix24.com/rest/1/placeholder".to_string()
        }));
        Self { webhook_base }
    }
}
