use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::transaction::{Direction, Transaction};
use super::LedgerError;

/// Financial summary of an account, computed over approved transactions only.
///
/// `average_balance` is the net flow per approved transaction:
/// `(total_deposits - total_withdrawals) / (deposit_count + withdrawal_count)`,
/// or zero when nothing is approved. It is not a time-weighted balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub account_id: Uuid,
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub deposit_count: usize,
    pub withdrawal_count: usize,
    pub average_balance: Decimal,
    pub transactions: Vec<Transaction>,
}

impl Report {
    /// Fails with `InvalidAmount` when a total leaves the representable decimal range.
    pub fn from_transactions(account_id: Uuid, transactions: Vec<Transaction>) -> Result<Self, LedgerError> {
        let mut total_deposits = Decimal::ZERO;
        let mut total_withdrawals = Decimal::ZERO;
        let mut deposit_count = 0;
        let mut withdrawal_count = 0;

        for tx in transactions.iter().filter(|tx| tx.is_approved()) {
            match tx.kind().direction() {
                Direction::Credit => {
                    total_deposits = accumulate(total_deposits, tx.magnitude())?;
                    deposit_count += 1;
                }
                Direction::Debit => {
                    total_withdrawals = accumulate(total_withdrawals, tx.magnitude())?;
                    withdrawal_count += 1;
                }
            }
        }

        let approved = deposit_count + withdrawal_count;
        let average_balance = if approved == 0 {
            Decimal::ZERO
        } else {
            total_deposits
                .checked_sub(total_withdrawals)
                .and_then(|net| net.checked_div(Decimal::from(approved)))
                .ok_or_else(|| LedgerError::invalid_amount(total_deposits, "net flow is out of range"))?
        };

        Ok(Self {
            account_id,
            total_deposits,
            total_withdrawals,
            deposit_count,
            withdrawal_count,
            average_balance,
            transactions,
        })
    }
}

fn accumulate(total: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    total
        .checked_add(amount)
        .ok_or_else(|| LedgerError::invalid_amount(amount, "report total is out of range"))
}
