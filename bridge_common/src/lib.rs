mod money;
mod secret;

pub mod helpers;

pub use money::{Cents, MoneyParseError};
pub use secret::Secret;
