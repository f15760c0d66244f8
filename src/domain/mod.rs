pub mod account;
pub mod error;
pub mod report;
pub mod transaction;

pub use account::Account;
pub use error::LedgerError;
pub use report::Report;
pub use transaction::{Direction, Transaction, TransactionKind, TransactionState};

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

/// Parse a textual identifier, rejecting malformed and nil UUIDs.
pub fn parse_identifier(field: &'static str, value: &str) -> Result<Uuid, LedgerError> {
    match Uuid::try_parse(value.trim()) {
        Ok(id) if !id.is_nil() => Ok(id),
        _ => Err(LedgerError::InvalidIdentifier {
            field,
            value: value.to_string(),
        }),
    }
}

/// Parse a currency amount as an exact decimal.
pub fn parse_amount(value: &str) -> Result<Decimal, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::invalid_amount(value, "amount is empty"));
    }
    Decimal::from_str(trimmed)
        .map_err(|_| LedgerError::invalid_amount(value, "not a decimal number"))
}
