use thiserror::Error;

#[derive(Debug, Error)]
pub enum BitrixApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Bitrix rejected the call: {code}. {description}")]
    ApiError { code: String, description: String },
    #[error("Bitrix returned no result for the call")]
    EmptyResponse,
}
