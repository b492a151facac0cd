use std::{collections::HashMap, env, path::PathBuf};

use bitrix_tools::{BitrixConfig, PaymentStatus};
use bridge_common::{helpers::parse_boolean_flag, Secret};
use log::*;

const DEFAULT_SBB_HOST: &str = "127.0.0.1";
const DEFAULT_SBB_PORT: u16 = 8360;
const DEFAULT_EVENT_LOG: &str = "webhook_events.jsonl";

/// Product id used for line items whose SKU has no entry in the SKU table. Rows are kept (with
/// this sentinel) rather than dropped, so the deal total still reflects the full order.
pub const UNMAPPED_PRODUCT_ID: i64 = 0;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shopify: ShopifyConfig,
    pub bitrix: BitrixConfig,
    pub mapping: MappingConfig,
    /// Every incoming webhook is journalled to this file before it is dispatched.
    pub event_log_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SBB_HOST.to_string(),
            port: DEFAULT_SBB_PORT,
            shopify: ShopifyConfig::default(),
            bitrix: BitrixConfig::default(),
            mapping: MappingConfig::default(),
            event_log_path: PathBuf::from(DEFAULT_EVENT_LOG),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("SBB_HOST").ok().unwrap_or_else(|| DEFAULT_SBB_HOST.into());
        let port = env::var("SBB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("{s} is not a valid port for SBB_PORT. {e} Using the default, {DEFAULT_SBB_PORT}, instead.");
                    DEFAULT_SBB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SBB_PORT);
        let event_log_path =
            env::var("SBB_EVENT_LOG").map(PathBuf::from).ok().unwrap_or_else(|| PathBuf::from(DEFAULT_EVENT_LOG));
        Self {
            host,
            port,
            shopify: ShopifyConfig::from_env_or_default(),
            bitrix: BitrixConfig::new_from_env_or_default(),
            mapping: MappingConfig::from_env_or_default(),
            event_log_path,
        }
    }
}

//-------------------------------------------------  ShopifyConfig  ----------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct ShopifyConfig {
    pub hmac_secret: Secret<String>,
    pub hmac_checks: bool,
}

impl ShopifyConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_secret = Secret::new(env::var("SBB_SHOPIFY_HMAC_SECRET").unwrap_or_else(|_| {
            error!("SBB_SHOPIFY_HMAC_SECRET is not set. Please set it to the webhook signing secret of your Shopify \
                    app, or disable HMAC checks explicitly with SBB_SHOPIFY_HMAC_CHECKS=0.");
            String::default()
        }));
        let hmac_checks = parse_boolean_flag(env::var("SBB_SHOPIFY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("Shopify HMAC checks are disabled. Anyone who can reach this server can forge order events.");
        }
        Self { hmac_secret, hmac_checks }
    }
}

//-------------------------------------------------  MappingConfig  ----------------------------------------------------

/// The static order→deal translation tables, loaded once at startup and injected into the
/// mapper and the sync flows. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    /// The Bitrix category (sales funnel) new deals are created in.
    pub category_id: i64,
    pub stages: StageMap,
    pub sources: SourceMap,
    /// If set, shipping charges become a synthetic product row with this product id. If unset,
    /// shipping is left off the deal.
    pub shipping_product_id: Option<i64>,
    pub sku_to_product_id: HashMap<String, i64>,
}

/// Stage ids per financial-status bucket. The defaults target category 2 of a stock Bitrix
/// portal and are overridable one by one via `SBB_STAGE_*`.
#[derive(Debug, Clone)]
pub struct StageMap {
    pub paid: String,
    pub pending: String,
    pub refunded: String,
    pub cancelled: String,
    pub new: String,
}

impl Default for StageMap {
    fn default() -> Self {
        Self {
            paid: "C2:WON".to_string(),
            pending: "C2:PREPARATION".to_string(),
            refunded: "C2:LOSE".to_string(),
            cancelled: "C2:LOSE".to_string(),
            new: "C2:NEW".to_string(),
        }
    }
}

/// `SOURCE_ID` values per Shopify `source_name`. Unset entries leave the field off the deal.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    pub shopify: Option<String>,
    pub draft_order: Option<String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            category_id: 2,
            stages: StageMap::default(),
            sources: SourceMap::default(),
            shipping_product_id: None,
            sku_to_product_id: HashMap::new(),
        }
    }
}

impl MappingConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let category_id = env::var("SBB_DEAL_CATEGORY_ID")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("Ignoring invalid SBB_DEAL_CATEGORY_ID ({s}): {e}"))
                    .ok()
            })
            .unwrap_or(defaults.category_id);
        let stage = |var: &str, default: String| env::var(var).ok().unwrap_or(default);
        let stages = StageMap {
            paid: stage("SBB_STAGE_PAID", defaults.stages.paid),
            pending: stage("SBB_STAGE_PENDING", defaults.stages.pending),
            refunded: stage("SBB_STAGE_REFUNDED", defaults.stages.refunded),
            cancelled: stage("SBB_STAGE_CANCELLED", defaults.stages.cancelled),
            new: stage("SBB_STAGE_NEW", defaults.stages.new),
        };
        let sources = SourceMap {
            shopify: env::var("SBB_SOURCE_ID_SHOPIFY").ok().filter(|s| !s.is_empty()),
            draft_order: env::var("SBB_SOURCE_ID_DRAFT_ORDER").ok().filter(|s| !s.is_empty()),
        };
        let shipping_product_id = env::var("SBB_SHIPPING_PRODUCT_ID").ok().and_then(|s| {
            s.parse::<i64>().map_err(|e| warn!("Ignoring invalid SBB_SHIPPING_PRODUCT_ID ({s}): {e}")).ok()
        });
        if shipping_product_id.is_none() {
            info!("SBB_SHIPPING_PRODUCT_ID is not set. Shipping charges will not appear on deals.");
        }
        let sku_to_product_id = env::var("SBB_SKU_PRODUCT_MAP").map(|s| parse_sku_map(&s)).unwrap_or_default();
        if sku_to_product_id.is_empty() {
            warn!(
                "The SKU table (SBB_SKU_PRODUCT_MAP) is empty. Every product row will use the unmapped-product \
                 sentinel id {UNMAPPED_PRODUCT_ID}."
            );
        }
        Self { category_id, stages, sources, shipping_product_id, sku_to_product_id }
    }

    /// Map an order's financial status to a deal stage. Total: unknown, empty and missing
    /// statuses land in the `new` stage.
    pub fn stage_for(&self, financial_status: Option<&str>) -> &str {
        match normalize(financial_status).as_str() {
            "paid" => &self.stages.paid,
            "pending" | "partially_paid" => &self.stages.pending,
            "refunded" | "partially_refunded" => &self.stages.refunded,
            "cancelled" | "voided" => &self.stages.cancelled,
            _ => &self.stages.new,
        }
    }

    /// Map an order's financial status to a `UF_CRM_PAYMENT_STATUS` code. Total: anything
    /// unrecognized is reported as not paid.
    pub fn payment_status_for(&self, financial_status: Option<&str>) -> PaymentStatus {
        match normalize(financial_status).as_str() {
            "paid" => PaymentStatus::Paid,
            "pending" => PaymentStatus::NotPaid,
            "refunded" => PaymentStatus::Refunded,
            "cancelled" | "voided" => PaymentStatus::Voided,
            "partially_paid" => PaymentStatus::PartiallyPaid,
            "partially_refunded" => PaymentStatus::PartiallyRefunded,
            _ => PaymentStatus::NotPaid,
        }
    }

    pub fn source_id_for(&self, source_name: &str) -> Option<String> {
        match source_name.trim().to_lowercase().as_str() {
            "shopify_draft_order" => self.sources.draft_order.clone(),
            "shopify" | "web" | "pos" => self.sources.shopify.clone(),
            _ => None,
        }
    }

    pub fn product_id_for_sku(&self, sku: Option<&str>) -> i64 {
        sku.and_then(|s| self.sku_to_product_id.get(s)).copied().unwrap_or(UNMAPPED_PRODUCT_ID)
    }
}

fn normalize(financial_status: Option<&str>) -> String {
    financial_status.unwrap_or_default().trim().to_lowercase()
}

/// Parse a comma-separated list of `SKU:product_id` pairs. Malformed entries are logged and
/// skipped rather than failing startup.
fn parse_sku_map(raw: &str) -> HashMap<String, i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let (sku, id) = pair.split_once(':')?;
            match id.trim().parse::<i64>() {
                Ok(id) => Some((sku.trim().to_string(), id)),
                Err(e) => {
                    warn!("Ignoring invalid entry in SBB_SKU_PRODUCT_MAP ({pair}): {e}");
                    None
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stage_mapping_is_total_and_case_insensitive() {
        let cfg = MappingConfig::default();
        for status in ["paid", "PAID", "Paid"] {
            assert_eq!(cfg.stage_for(Some(status)), "C2:WON");
        }
        assert_eq!(cfg.stage_for(Some("pending")), "C2:PREPARATION");
        assert_eq!(cfg.stage_for(Some("partially_paid")), "C2:PREPARATION");
        assert_eq!(cfg.stage_for(Some("refunded")), "C2:LOSE");
        assert_eq!(cfg.stage_for(Some("partially_refunded")), "C2:LOSE");
        assert_eq!(cfg.stage_for(Some("cancelled")), "C2:LOSE");
        assert_eq!(cfg.stage_for(Some("voided")), "C2:LOSE");
        assert_eq!(cfg.stage_for(Some("authorized")), "C2:NEW");
        assert_eq!(cfg.stage_for(Some("")), "C2:NEW");
        assert_eq!(cfg.stage_for(None), "C2:NEW");
    }

    #[test]
    fn payment_status_mapping_is_total_and_case_insensitive() {
        let cfg = MappingConfig::default();
        for status in ["paid", "PAID", "Paid"] {
            assert_eq!(cfg.payment_status_for(Some(status)), PaymentStatus::Paid);
        }
        assert_eq!(cfg.payment_status_for(Some("pending")), PaymentStatus::NotPaid);
        assert_eq!(cfg.payment_status_for(Some("refunded")), PaymentStatus::Refunded);
        assert_eq!(cfg.payment_status_for(Some("cancelled")), PaymentStatus::Voided);
        assert_eq!(cfg.payment_status_for(Some("voided")), PaymentStatus::Voided);
        assert_eq!(cfg.payment_status_for(Some("partially_paid")), PaymentStatus::PartiallyPaid);
        assert_eq!(cfg.payment_status_for(Some("partially_refunded")), PaymentStatus::PartiallyRefunded);
        assert_eq!(cfg.payment_status_for(Some("authorized")), PaymentStatus::NotPaid);
        assert_eq!(cfg.payment_status_for(None), PaymentStatus::NotPaid);
    }

    #[test]
    fn sku_map_parsing() {
        let map = parse_sku_map("ALB0002:101, ALB0005:102,broken,also:bad-id");
        assert_eq!(map.len(), 2);
        assert_eq!(map["ALB0002"], 101);
        assert_eq!(map["ALB0005"], 102);
    }

    #[test]
    fn unmapped_skus_fall_back_to_the_sentinel() {
        let mut cfg = MappingConfig::default();
        cfg.sku_to_product_id.insert("ALB0002".to_string(), 101);
        assert_eq!(cfg.product_id_for_sku(Some("ALB0002")), 101);
        assert_eq!(cfg.product_id_for_sku(Some("UNKNOWN")), UNMAPPED_PRODUCT_ID);
        assert_eq!(cfg.product_id_for_sku(None), UNMAPPED_PRODUCT_ID);
    }

    #[test]
    fn source_lookup() {
        let cfg = MappingConfig {
            sources: SourceMap { shopify: Some("WEB".to_string()), draft_order: None },
            ..Default::default()
        };
        assert_eq!(cfg.source_id_for("web"), Some("WEB".to_string()));
        assert_eq!(cfg.source_id_for("pos"), Some("WEB".to_string()));
        assert_eq!(cfg.source_id_for("shopify_draft_order"), None);
        assert_eq!(cfg.source_id_for("carrier-pigeon"), None);
    }
}
