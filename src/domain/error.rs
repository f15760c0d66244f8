use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::transaction::TransactionState;
use crate::db::StorageError;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The referenced account does not exist.
    #[error("account {account_id} does not exist")]
    AccountNotFound { account_id: Uuid },

    /// The referenced transaction does not exist (or belongs to another account).
    #[error("transaction {transaction_id} does not exist")]
    TransactionNotFound { transaction_id: Uuid },

    /// Malformed, zero or out-of-range amount.
    #[error("invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("malformed identifier '{value}' for {field}")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("unknown transaction kind '{value}', expected one of {expected}")]
    InvalidKind { value: String, expected: String },

    #[error("invalid transaction state '{value}', expected one of {expected}")]
    InvalidState { value: String, expected: String },

    #[error("malformed timestamp '{value}', expected RFC 3339")]
    InvalidTimestamp { value: String },

    /// Approved and rejected transactions are terminal.
    #[error("transaction {transaction_id} cannot move from {from} to {to}")]
    IllegalTransition {
        transaction_id: Uuid,
        from: TransactionState,
        to: TransactionState,
    },

    /// A client-chosen transaction id was already recorded.
    #[error("transaction {transaction_id} was already recorded")]
    DuplicateTransaction { transaction_id: Uuid },

    #[error("amount {amount} exceeds the daily limit of {daily_limit} on account {account_id}")]
    LimitExceeded {
        account_id: Uuid,
        amount: Decimal,
        daily_limit: Decimal,
    },

    #[error("insufficient funds on account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: Uuid,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl LedgerError {
    pub fn invalid_amount(amount: impl ToString, reason: impl Into<String>) -> Self {
        LedgerError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AccountNotFound { .. } => "account_not_found",
            LedgerError::TransactionNotFound { .. } => "transaction_not_found",
            LedgerError::InvalidAmount { .. } => "invalid_amount",
            LedgerError::InvalidIdentifier { .. } => "invalid_identifier",
            LedgerError::InvalidKind { .. } => "invalid_kind",
            LedgerError::InvalidState { .. } => "invalid_state",
            LedgerError::InvalidTimestamp { .. } => "invalid_timestamp",
            LedgerError::IllegalTransition { .. } => "illegal_transition",
            LedgerError::DuplicateTransaction { .. } => "duplicate_transaction",
            LedgerError::LimitExceeded { .. } => "limit_exceeded",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::Storage(_) => "storage_error",
        }
    }

    /// Whether the failure was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, LedgerError::Storage(_))
    }
}
