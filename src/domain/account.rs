use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{parse_identifier, LedgerError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    id: Uuid,
    owner_id: Uuid,
    balance: Decimal,
    daily_limit: Decimal,
}

impl Account {
    /// Build an account, validating every field.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentifier` when `id` or `owner_id` is nil
    /// - `InvalidAmount` when the balance is negative or the daily limit is not positive
    pub fn new(
        id: Uuid,
        owner_id: Uuid,
        balance: Decimal,
        daily_limit: Decimal,
    ) -> Result<Self, LedgerError> {
        if id.is_nil() {
            return Err(LedgerError::InvalidIdentifier {
                field: "id",
                value: id.to_string(),
            });
        }
        if owner_id.is_nil() {
            return Err(LedgerError::InvalidIdentifier {
                field: "owner_id",
                value: owner_id.to_string(),
            });
        }
        if balance < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(
                balance,
                "balance cannot be negative",
            ));
        }
        if daily_limit <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(
                daily_limit,
                "daily limit must be greater than zero",
            ));
        }

        Ok(Self {
            id,
            owner_id,
            balance,
            daily_limit,
        })
    }

    /// Build an account from textual identifiers, as they arrive from requests or rows.
    pub fn parse(
        id: &str,
        owner_id: &str,
        balance: Decimal,
        daily_limit: Decimal,
    ) -> Result<Self, LedgerError> {
        let id = parse_identifier("id", id)?;
        let owner_id = parse_identifier("owner_id", owner_id)?;
        Self::new(id, owner_id, balance, daily_limit)
    }

    /// Open a fresh account with a generated id.
    pub fn open(owner_id: Uuid, balance: Decimal, daily_limit: Decimal) -> Result<Self, LedgerError> {
        Self::new(Uuid::new_v4(), owner_id, balance, daily_limit)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn daily_limit(&self) -> Decimal {
        self.daily_limit
    }

    /// Balance after adding the signed `amount`, if it is representable.
    pub fn balance_after(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invalid_amount(amount, "resulting balance is out of range"))
    }

    /// Add a signed amount to the balance. Limit and funds must already be validated.
    pub(crate) fn apply(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        self.balance = self.balance_after(amount)?;
        Ok(())
    }

    /// Fails when the magnitude of `amount` is above the daily limit.
    pub fn check_daily_limit(&self, amount: Decimal) -> Result<(), LedgerError> {
        if amount.abs() > self.daily_limit {
            return Err(LedgerError::LimitExceeded {
                account_id: self.id,
                amount: amount.abs(),
                daily_limit: self.daily_limit,
            });
        }
        Ok(())
    }

    /// Fails when applying the signed `amount` would leave the balance negative.
    pub fn check_funds(&self, amount: Decimal) -> Result<(), LedgerError> {
        if self.balance_after(amount)? < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                account_id: self.id,
                balance: self.balance,
                requested: amount.abs(),
            });
        }
        Ok(())
    }
}
