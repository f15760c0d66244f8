use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::StorageError;

pub fn parse_uuid(column: &str, value: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(value)
        .map_err(|err| StorageError::corrupt(format!("{column} '{value}' is not a uuid: {err}")))
}

pub fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|err| StorageError::corrupt(format!("{column} '{value}' is not a decimal: {err}")))
}

pub fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StorageError::corrupt(format!("{column} '{value}' is not RFC 3339: {err}")))
}

// keeps sub-second precision so timestamps round-trip exactly
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
