use async_trait::async_trait;
use uuid::Uuid;

use super::{AccountStore, StorageError, TransactionStore};
use crate::domain::{Account, Transaction};

/// Reads hit the primary. Writes hit both; a secondary failure is only logged.
pub struct MirroredStore<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> MirroredStore<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

fn swallow(result: Result<(), StorageError>, record: &str, id: Uuid) {
    if let Err(err) = result {
        tracing::warn!(%id, error = %err, "secondary store failed to save {record}, continuing");
    }
}

#[async_trait]
impl<P: AccountStore, S: AccountStore> AccountStore for MirroredStore<P, S> {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, StorageError> {
        self.primary.get_account(id).await
    }

    async fn save_account(&self, account: &Account) -> Result<(), StorageError> {
        let (primary, secondary) = futures::join!(
            self.primary.save_account(account),
            self.secondary.save_account(account)
        );
        swallow(secondary, "account", account.id());
        primary
    }

    async fn list_accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StorageError> {
        self.primary.list_accounts_for_owner(owner_id).await
    }
}

#[async_trait]
impl<P: TransactionStore, S: TransactionStore> TransactionStore for MirroredStore<P, S> {
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StorageError> {
        self.primary.get_transaction(id).await
    }

    async fn get_transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StorageError> {
        self.primary.get_transactions_for_account(account_id).await
    }

    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), StorageError> {
        let (primary, secondary) = futures::join!(
            self.primary.save_transaction(transaction),
            self.secondary.save_transaction(transaction)
        );
        swallow(secondary, "transaction", transaction.id());
        primary
    }
}
