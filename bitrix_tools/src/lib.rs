mod api;
mod config;
mod error;

mod data_objects;
mod traits;

pub use api::BitrixApi;
pub use config::BitrixConfig;
pub use data_objects::{BitrixResponse, DealFields, DealSummary, NewContact, PaymentStatus, ProductRow};
pub use error::BitrixApiError;
pub use traits::CrmOperations;
