use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Account, Transaction};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record could not be turned back into an entity.
    #[error("corrupt record: {message}")]
    Corrupt { message: String },

    /// A transaction id is already recorded against another account.
    #[error("transaction {transaction_id} belongs to another account")]
    Conflict { transaction_id: Uuid },
}

impl StorageError {
    pub fn corrupt(message: impl Into<String>) -> Self {
        StorageError::Corrupt {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch an account, `None` when it does not exist.
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, StorageError>;

    /// Insert or overwrite an account.
    async fn save_account(&self, account: &Account) -> Result<(), StorageError>;

    /// Every account owned by a user.
    async fn list_accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StorageError>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StorageError>;

    /// All transactions of an account, in the store's own order.
    async fn get_transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StorageError>;

    /// Insert a transaction, or update the state of an existing one.
    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), StorageError>;
}
