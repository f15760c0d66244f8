use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{AccountStore, StorageError, TransactionStore};
use crate::domain::{Account, Transaction};

/// In-process store with no I/O.
///
/// Transactions are kept per account in insertion order, with a side index from
/// transaction id to account id for direct lookups.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: DashMap<Uuid, Account>,
    transactions: DashMap<Uuid, Vec<Transaction>>,
    index: DashMap<Uuid, Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, StorageError> {
        Ok(self.accounts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save_account(&self, account: &Account) -> Result<(), StorageError> {
        self.accounts.insert(account.id(), account.clone());
        Ok(())
    }

    async fn list_accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StorageError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| entry.owner_id() == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(Account::id);
        Ok(accounts)
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StorageError> {
        let Some(account_id) = self.index.get(&id).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self
            .transactions
            .get(&account_id)
            .and_then(|list| list.iter().find(|tx| tx.id() == id).cloned()))
    }

    async fn get_transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StorageError> {
        Ok(self
            .transactions
            .get(&account_id)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }

    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), StorageError> {
        if let Some(owner) = self.index.get(&transaction.id()) {
            if *owner != transaction.account_id() {
                return Err(StorageError::Conflict {
                    transaction_id: transaction.id(),
                });
            }
        }
        let mut list = self.transactions.entry(transaction.account_id()).or_default();
        match list.iter_mut().find(|tx| tx.id() == transaction.id()) {
            Some(existing) => *existing = transaction.clone(),
            None => list.push(transaction.clone()),
        }
        self.index.insert(transaction.id(), transaction.account_id());
        Ok(())
    }
}

/// Store whose writes can be switched to fail, for exercising error paths.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_account_writes: std::sync::atomic::AtomicBool,
    pub fail_transaction_writes: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl FlakyStore {
    fn check(flag: &std::sync::atomic::AtomicBool, what: &str) -> Result<(), StorageError> {
        if flag.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{what} write refused"),
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl AccountStore for FlakyStore {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, StorageError> {
        self.inner.get_account(id).await
    }

    async fn save_account(&self, account: &Account) -> Result<(), StorageError> {
        Self::check(&self.fail_account_writes, "account")?;
        self.inner.save_account(account).await
    }

    async fn list_accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StorageError> {
        self.inner.list_accounts_for_owner(owner_id).await
    }
}

#[cfg(test)]
#[async_trait]
impl TransactionStore for FlakyStore {
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StorageError> {
        self.inner.get_transaction(id).await
    }

    async fn get_transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StorageError> {
        self.inner.get_transactions_for_account(account_id).await
    }

    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), StorageError> {
        Self::check(&self.fail_transaction_writes, "transaction")?;
        self.inner.save_transaction(transaction).await
    }
}
