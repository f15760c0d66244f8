use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LedgerError;

/// A deposit or withdrawal against one account.
///
/// The amount is signed: credit kinds carry a positive amount, debit kinds a
/// negative one. Everything but `state` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    id: Uuid,
    account_id: Uuid,
    amount: Decimal,
    kind: TransactionKind,
    state: TransactionState,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    Pending,
    Approved,
    Rejected,
}

/// Which way a transaction moves money relative to its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::Deposit,
        TransactionKind::Withdrawal,
        TransactionKind::TransferIn,
        TransactionKind::TransferOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::TransferIn => "TRANSFER_IN",
            TransactionKind::TransferOut => "TRANSFER_OUT",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TransactionKind::Deposit | TransactionKind::TransferIn => Direction::Credit,
            TransactionKind::Withdrawal | TransactionKind::TransferOut => Direction::Debit,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "Adds money to the account.",
            TransactionKind::Withdrawal => "Takes money out of the account within its limits.",
            TransactionKind::TransferIn => "Receives money moved from another account.",
            TransactionKind::TransferOut => "Sends money to another account within its limits.",
        }
    }

    /// Sign a request amount according to the kind.
    ///
    /// Debit kinds accept either sign and use the magnitude. A credit kind with a
    /// negative amount contradicts itself and is refused.
    pub fn signed_amount(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::invalid_amount(amount, "amount must be non-zero"));
        }
        match self.direction() {
            Direction::Credit if amount < Decimal::ZERO => Err(LedgerError::invalid_amount(
                amount,
                format!("{} amount must be positive", self.as_str().to_lowercase()),
            )),
            Direction::Credit => Ok(amount),
            Direction::Debit => Ok(-amount.abs()),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "DEPOSIT" | "DEPOSITO" => Ok(TransactionKind::Deposit),
            "WITHDRAWAL" | "RETIRO" => Ok(TransactionKind::Withdrawal),
            "TRANSFER_IN" => Ok(TransactionKind::TransferIn),
            "TRANSFER_OUT" => Ok(TransactionKind::TransferOut),
            _ => Err(LedgerError::InvalidKind {
                value: value.to_string(),
                expected: list(&TransactionKind::ALL),
            }),
        }
    }
}

impl TransactionState {
    pub const ALL: [TransactionState; 3] = [
        TransactionState::Pending,
        TransactionState::Approved,
        TransactionState::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Pending => "PENDING",
            TransactionState::Approved => "APPROVED",
            TransactionState::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::Pending)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionState {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PENDIENTE" => Ok(TransactionState::Pending),
            "APPROVED" | "APROBADA" => Ok(TransactionState::Approved),
            "REJECTED" | "RECHAZADA" => Ok(TransactionState::Rejected),
            _ => Err(LedgerError::InvalidState {
                value: value.to_string(),
                expected: list(&TransactionState::ALL),
            }),
        }
    }
}

fn list<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Transaction {
    /// Create a pending transaction, signing `amount` according to `kind`.
    pub fn new(
        id: Uuid,
        account_id: Uuid,
        kind: TransactionKind,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        Self::restore(
            id,
            account_id,
            kind.signed_amount(amount)?,
            kind,
            TransactionState::Pending,
            timestamp,
        )
    }

    /// Rebuild a transaction from persisted fields. The amount must already be signed.
    pub fn restore(
        id: Uuid,
        account_id: Uuid,
        amount: Decimal,
        kind: TransactionKind,
        state: TransactionState,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if id.is_nil() {
            return Err(LedgerError::InvalidIdentifier {
                field: "id",
                value: id.to_string(),
            });
        }
        if account_id.is_nil() {
            return Err(LedgerError::InvalidIdentifier {
                field: "account_id",
                value: account_id.to_string(),
            });
        }
        if kind.signed_amount(amount)? != amount {
            return Err(LedgerError::invalid_amount(
                amount,
                format!("sign does not match {kind}"),
            ));
        }

        Ok(Self {
            id,
            account_id,
            amount,
            kind,
            state,
            timestamp,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    /// Signed amount: positive for credits, negative for debits.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn magnitude(&self) -> Decimal {
        self.amount.abs()
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_approved(&self) -> bool {
        self.state == TransactionState::Approved
    }

    pub fn approve(&mut self) -> Result<(), LedgerError> {
        self.transition(TransactionState::Approved)
    }

    pub fn reject(&mut self) -> Result<(), LedgerError> {
        self.transition(TransactionState::Rejected)
    }

    fn transition(&mut self, to: TransactionState) -> Result<(), LedgerError> {
        if self.state.is_terminal() {
            return Err(LedgerError::IllegalTransition {
                transaction_id: self.id,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
