use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use super::{AccountStore, StorageError, TransactionStore};
use crate::domain::{Account, Transaction, TransactionKind, TransactionState};

const DOCUMENT_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";
const ACCOUNTS_DIR: &str = "accounts";
const TRANSACTIONS_DIR: &str = "transactions";

// accounts/<account_id>.json, transactions/<account_id>/<transaction_id>.json
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccountDocument {
    id: Uuid,
    owner_id: Uuid,
    balance: Decimal,
    daily_limit: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransactionDocument {
    id: Uuid,
    account_id: Uuid,
    amount: Decimal,
    kind: TransactionKind,
    state: TransactionState,
    timestamp: DateTime<Utc>,
}

impl From<&Account> for AccountDocument {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            owner_id: account.owner_id(),
            balance: account.balance(),
            daily_limit: account.daily_limit(),
        }
    }
}

impl TryFrom<AccountDocument> for Account {
    type Error = StorageError;

    fn try_from(doc: AccountDocument) -> Result<Self, Self::Error> {
        Account::new(doc.id, doc.owner_id, doc.balance, doc.daily_limit)
            .map_err(|err| StorageError::corrupt(format!("account document {}: {err}", doc.id)))
    }
}

impl From<&Transaction> for TransactionDocument {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id(),
            account_id: tx.account_id(),
            amount: tx.amount(),
            kind: tx.kind(),
            state: tx.state(),
            timestamp: tx.timestamp(),
        }
    }
}

impl TryFrom<TransactionDocument> for Transaction {
    type Error = StorageError;

    fn try_from(doc: TransactionDocument) -> Result<Self, Self::Error> {
        Transaction::restore(doc.id, doc.account_id, doc.amount, doc.kind, doc.state, doc.timestamp)
            .map_err(|err| StorageError::corrupt(format!("transaction document {}: {err}", doc.id)))
    }
}

impl DocumentStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(root.join(ACCOUNTS_DIR)).await?;
        fs::create_dir_all(root.join(TRANSACTIONS_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn account_path(&self, id: Uuid) -> PathBuf {
        self.root
            .join(ACCOUNTS_DIR)
            .join(format!("{id}.{DOCUMENT_EXTENSION}"))
    }

    fn transactions_dir(&self, account_id: Uuid) -> PathBuf {
        self.root.join(TRANSACTIONS_DIR).join(account_id.to_string())
    }

    fn transaction_path(&self, account_id: Uuid, id: Uuid) -> PathBuf {
        self.transactions_dir(account_id)
            .join(format!("{id}.{DOCUMENT_EXTENSION}"))
    }
}

async fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(document)?;
    let tmp = path.with_extension(TMP_SUFFIX);
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Paths of the finished documents in a directory; leftover temporaries are skipped.
async fn document_paths(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION) {
            paths.push(path);
        }
    }
    Ok(paths)
}

#[async_trait]
impl AccountStore for DocumentStore {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, StorageError> {
        read_document::<AccountDocument>(&self.account_path(id))
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn save_account(&self, account: &Account) -> Result<(), StorageError> {
        write_document(&self.account_path(account.id()), &AccountDocument::from(account)).await
    }

    async fn list_accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StorageError> {
        let mut accounts = Vec::new();
        for path in document_paths(&self.root.join(ACCOUNTS_DIR)).await? {
            if let Some(doc) = read_document::<AccountDocument>(&path).await? {
                if doc.owner_id == owner_id {
                    accounts.push(Account::try_from(doc)?);
                }
            }
        }
        accounts.sort_by_key(Account::id);
        Ok(accounts)
    }
}

#[async_trait]
impl TransactionStore for DocumentStore {
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StorageError> {
        let mut account_dirs = fs::read_dir(self.root.join(TRANSACTIONS_DIR)).await?;
        while let Some(entry) = account_dirs.next_entry().await? {
            let path = entry.path().join(format!("{id}.{DOCUMENT_EXTENSION}"));
            if let Some(doc) = read_document::<TransactionDocument>(&path).await? {
                return Transaction::try_from(doc).map(Some);
            }
        }
        Ok(None)
    }

    async fn get_transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StorageError> {
        let mut transactions = Vec::new();
        for path in document_paths(&self.transactions_dir(account_id)).await? {
            if let Some(doc) = read_document::<TransactionDocument>(&path).await? {
                transactions.push(Transaction::try_from(doc)?);
            }
        }
        // directory order is arbitrary, so order by when the transactions happened
        transactions.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(transactions)
    }

    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), StorageError> {
        fs::create_dir_all(self.transactions_dir(transaction.account_id())).await?;
        let path = self.transaction_path(transaction.account_id(), transaction.id());
        write_document(&path, &TransactionDocument::from(transaction)).await
    }
}
