use bitrix_tools::BitrixApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

#[derive(Debug, Error)]
#[error("Could not convert the shopify order into deal fields. {0}.")]
pub struct OrderConversionError(pub String);

/// Failures of the create/update flows that invalidate the whole delivery. Best-effort steps
/// (contact upsert, product rows, event journalling) never surface here; they are downgraded to
/// warnings at the step that failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Order conversion failed. {0}")]
    OrderConversion(#[from] OrderConversionError),
    #[error("CRM call failed. {0}")]
    Crm(#[from] BitrixApiError),
}
