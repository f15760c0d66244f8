use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::db::{AccountStore, StorageError, TransactionStore};
use crate::domain::{
    parse_amount, Account, Direction, LedgerError, Report, Transaction, TransactionKind,
};

/// An unvalidated request to move money on an account.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub account_id: Uuid,
    /// Raw amount text, validated by the processor.
    pub amount: String,
    pub kind: TransactionKind,
    pub id: Option<Uuid>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    pub fn new(account_id: Uuid, kind: TransactionKind, amount: impl Into<String>) -> Self {
        Self {
            account_id,
            amount: amount.into(),
            kind,
            id: None,
            timestamp: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// One async mutex per key, dropped from the table once nobody holds or waits on it.
#[derive(Debug, Default)]
struct KeyedLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

struct KeyedGuard<'a> {
    locks: &'a DashMap<Uuid, Arc<Mutex<()>>>,
    key: Uuid,
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    async fn acquire(&self, key: Uuid) -> KeyedGuard<'_> {
        // clone the Arc out so no map shard stays locked across the await
        let lock = self.locks.entry(key).or_default().clone();
        KeyedGuard {
            locks: &self.locks,
            key,
            _guard: lock.lock_owned().await,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        // the table and this guard are the only owners left
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 2);
    }
}

/// Turns transaction requests into balance changes.
///
/// Requests against one account are serialized from the account load to the account
/// save. A refused request leaves both stores untouched. The two saves are not atomic.
pub struct TransactionProcessor {
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
    account_locks: KeyedLocks,
    id_locks: KeyedLocks,
}

impl TransactionProcessor {
    pub fn new(accounts: Arc<dyn AccountStore>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            accounts,
            transactions,
            account_locks: KeyedLocks::default(),
            id_locks: KeyedLocks::default(),
        }
    }

    async fn load_account(&self, account_id: Uuid) -> Result<Account, LedgerError> {
        self.accounts
            .get_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound { account_id })
    }

    #[tracing::instrument(
        name = "process_transaction",
        skip(self, request),
        fields(account_id = %request.account_id, kind = %request.kind)
    )]
    pub async fn process(&self, request: TransactionRequest) -> Result<Transaction, LedgerError> {
        let _account_guard = self.account_locks.acquire(request.account_id).await;

        let mut account = self.load_account(request.account_id).await?;

        let amount = parse_amount(&request.amount)?;
        let mut transaction = Transaction::new(
            request.id.unwrap_or_else(Uuid::new_v4),
            account.id(),
            request.kind,
            amount,
            request.timestamp.unwrap_or_else(Utc::now),
        )?;

        // a client id may be replayed against any account, so it is locked on its own.
        // id locks are always taken after the account lock.
        let _id_guard = match request.id {
            Some(id) => {
                let guard = self.id_locks.acquire(id).await;
                if self.transactions.get_transaction(id).await?.is_some() {
                    return Err(LedgerError::DuplicateTransaction { transaction_id: id });
                }
                Some(guard)
            }
            None => None,
        };

        if let Err(err) = self.validate(&account, &transaction) {
            tracing::warn!(transaction_id = %transaction.id(), "Transaction rejected: {err}");
            return Err(err);
        }

        account.apply(transaction.amount())?;
        transaction.approve()?;

        self.transactions
            .save_transaction(&transaction)
            .await
            .map_err(|err| match err {
                StorageError::Conflict { transaction_id } => {
                    LedgerError::DuplicateTransaction { transaction_id }
                }
                other => other.into(),
            })?;
        self.accounts.save_account(&account).await?;

        tracing::info!(
            transaction_id = %transaction.id(),
            amount = %transaction.amount(),
            balance = %account.balance(),
            "Transaction approved: {}",
            transaction.kind().description()
        );
        Ok(transaction)
    }

    fn validate(&self, account: &Account, transaction: &Transaction) -> Result<(), LedgerError> {
        account.check_daily_limit(transaction.amount())?;
        match transaction.kind().direction() {
            Direction::Debit => account.check_funds(transaction.amount()),
            Direction::Credit => account.balance_after(transaction.amount()).map(|_| ()),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        self.load_account(account_id).await?;
        let transactions = self.transactions.get_transactions_for_account(account_id).await?;
        tracing::debug!(count = transactions.len(), "Transactions listed");
        Ok(transactions)
    }

    /// Look up one transaction, scoped to the account it belongs to.
    pub async fn get_transaction(
        &self,
        account_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Transaction, LedgerError> {
        self.load_account(account_id).await?;
        self.transactions
            .get_transaction(transaction_id)
            .await?
            .filter(|tx| tx.account_id() == account_id)
            .ok_or(LedgerError::TransactionNotFound { transaction_id })
    }

    #[tracing::instrument(skip(self))]
    pub async fn summarize(&self, account_id: Uuid) -> Result<Report, LedgerError> {
        let transactions = self.list_for_account(account_id).await?;
        Report::from_transactions(account_id, transactions)
    }
}
