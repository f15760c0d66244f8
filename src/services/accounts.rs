use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::AccountStore;
use crate::domain::{Account, LedgerError};

/// Values applied to fields a new account request leaves out.
#[derive(Debug, Clone)]
pub struct AccountDefaults {
    pub opening_balance: Decimal,
    pub daily_limit: Decimal,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            opening_balance: dec!(0.00),
            daily_limit: dec!(2000.00),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenAccount {
    pub owner_id: Option<Uuid>,
    pub balance: Option<Decimal>,
    pub daily_limit: Option<Decimal>,
}

// Account management service
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    defaults: AccountDefaults,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>, defaults: AccountDefaults) -> Self {
        Self { accounts, defaults }
    }

    /// Open an account, generating an owner when none is given.
    pub async fn open(&self, req: OpenAccount) -> Result<Account, LedgerError> {
        let account = Account::open(
            req.owner_id.unwrap_or_else(Uuid::new_v4),
            req.balance.unwrap_or(self.defaults.opening_balance),
            req.daily_limit.unwrap_or(self.defaults.daily_limit),
        )?;
        self.accounts.save_account(&account).await?;
        tracing::info!(account_id = %account.id(), owner_id = %account.owner_id(), "Account opened");
        Ok(account)
    }

    pub async fn get(&self, account_id: Uuid) -> Result<Account, LedgerError> {
        self.accounts
            .get_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound { account_id })
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, LedgerError> {
        Ok(self.accounts.list_accounts_for_owner(owner_id).await?)
    }
}
