use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use uuid::Uuid;

use super::{
    utils::{format_timestamp, parse_decimal, parse_timestamp, parse_uuid},
    AccountStore, StorageError, TransactionStore,
};
use crate::domain::{Account, Transaction, TransactionKind, TransactionState};

// Relational store backed by SQLite
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn account_from_row(row: &SqliteRow) -> Result<Account, StorageError> {
    let id: String = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let balance: String = row.try_get("balance")?;
    let daily_limit: String = row.try_get("daily_limit")?;

    Account::new(
        parse_uuid("id", &id)?,
        parse_uuid("owner_id", &owner_id)?,
        parse_decimal("balance", &balance)?,
        parse_decimal("daily_limit", &daily_limit)?,
    )
    .map_err(|err| StorageError::corrupt(format!("account {id}: {err}")))
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, StorageError> {
    let id: String = row.try_get("id")?;
    let account_id: String = row.try_get("account_id")?;
    let amount: String = row.try_get("amount")?;
    let kind: String = row.try_get("kind")?;
    let state: String = row.try_get("state")?;
    let timestamp: String = row.try_get("timestamp")?;

    let kind = TransactionKind::from_str(&kind)
        .map_err(|err| StorageError::corrupt(format!("transaction {id}: {err}")))?;
    let state = TransactionState::from_str(&state)
        .map_err(|err| StorageError::corrupt(format!("transaction {id}: {err}")))?;

    Transaction::restore(
        parse_uuid("id", &id)?,
        parse_uuid("account_id", &account_id)?,
        parse_decimal("amount", &amount)?,
        kind,
        state,
        parse_timestamp("timestamp", &timestamp)?,
    )
    .map_err(|err| StorageError::corrupt(format!("transaction {id}: {err}")))
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, balance, daily_limit
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn save_account(&self, account: &Account) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, owner_id, balance, daily_limit)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                balance = excluded.balance,
                daily_limit = excluded.daily_limit
            "#,
        )
        .bind(account.id().to_string())
        .bind(account.owner_id().to_string())
        .bind(account.balance().to_string())
        .bind(account.daily_limit().to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, balance, daily_limit
            FROM accounts
            WHERE owner_id = ?
            ORDER BY ROWID
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(account_from_row).collect()
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, amount, kind, state, timestamp
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn get_transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount, kind, state, timestamp
            FROM transactions
            WHERE account_id = ?
            ORDER BY ROWID
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), StorageError> {
        // only the state of a recorded transaction may change
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id, amount, kind, state, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET state = excluded.state
            WHERE transactions.account_id = excluded.account_id
            "#,
        )
        .bind(transaction.id().to_string())
        .bind(transaction.account_id().to_string())
        .bind(transaction.amount().to_string())
        .bind(transaction.kind().as_str())
        .bind(transaction.state().as_str())
        .bind(format_timestamp(transaction.timestamp()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict {
                transaction_id: transaction.id(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    async fn setup_test() -> SqliteStore {
        // a single connection keeps every query on the same in-memory database
        let store = SqliteStore::connect("sqlite::memory:", 1)
            .await
            .expect("Failed to open in-memory database");
        store.migrate().await.expect("Failed to run migrations");
        store
    }

    fn approved(account: &Account, kind: TransactionKind, amount: rust_decimal::Decimal) -> Transaction {
        let mut tx = Transaction::new(Uuid::new_v4(), account.id(), kind, amount, Utc::now()).unwrap();
        tx.approve().unwrap();
        tx
    }

    #[tokio::test]
    async fn test_account_round_trip_and_upsert() {
        let store = setup_test().await;
        let mut account = Account::open(Uuid::new_v4(), dec!(500.00), dec!(1000.00)).unwrap();

        assert!(store.get_account(account.id()).await.unwrap().is_none());

        store.save_account(&account).await.unwrap();
        assert_eq!(store.get_account(account.id()).await.unwrap(), Some(account.clone()));

        account.apply(dec!(-120.25)).unwrap();
        store.save_account(&account).await.unwrap();
        let loaded = store.get_account(account.id()).await.unwrap().unwrap();
        assert_eq!(loaded.balance(), dec!(379.75));
        assert_eq!(loaded.balance().to_string(), "379.75");
    }

    #[tokio::test]
    async fn test_list_accounts_for_owner() {
        let store = setup_test().await;
        let owner = Uuid::new_v4();
        let first = Account::open(owner, dec!(0), dec!(2000)).unwrap();
        let second = Account::open(owner, dec!(10), dec!(2000)).unwrap();
        let other = Account::open(Uuid::new_v4(), dec!(0), dec!(2000)).unwrap();
        for account in [&first, &second, &other] {
            store.save_account(account).await.unwrap();
        }

        let owned = store.list_accounts_for_owner(owner).await.unwrap();
        assert_eq!(owned, vec![first, second]);
    }

    #[tokio::test]
    async fn test_transactions_round_trip_in_insertion_order() {
        let store = setup_test().await;
        let account = Account::open(Uuid::new_v4(), dec!(0), dec!(2000)).unwrap();
        let deposit = approved(&account, TransactionKind::Deposit, dec!(100.00));
        let withdrawal = approved(&account, TransactionKind::Withdrawal, dec!(40.00));

        store.save_transaction(&deposit).await.unwrap();
        store.save_transaction(&withdrawal).await.unwrap();

        let listed = store.get_transactions_for_account(account.id()).await.unwrap();
        assert_eq!(listed, vec![deposit.clone(), withdrawal.clone()]);
        assert_eq!(listed[1].amount(), dec!(-40.00));

        assert_eq!(store.get_transaction(deposit.id()).await.unwrap(), Some(deposit));
        assert!(store.get_transaction(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store
            .get_transactions_for_account(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_transaction_id_cannot_move_to_another_account() {
        let store = setup_test().await;
        let first = Account::open(Uuid::new_v4(), dec!(0), dec!(2000)).unwrap();
        let second = Account::open(Uuid::new_v4(), dec!(0), dec!(2000)).unwrap();
        let mut tx = Transaction::new(Uuid::new_v4(), first.id(), TransactionKind::Deposit, dec!(5), Utc::now())
            .unwrap();
        store.save_transaction(&tx).await.unwrap();
        tx.approve().unwrap();
        store.save_transaction(&tx).await.unwrap();

        let stolen = Transaction::new(tx.id(), second.id(), TransactionKind::Deposit, dec!(5), Utc::now()).unwrap();
        let err = store.save_transaction(&stolen).await.unwrap_err();

        assert!(matches!(err, StorageError::Conflict { transaction_id } if transaction_id == tx.id()));
        assert_eq!(store.get_transaction(tx.id()).await.unwrap(), Some(tx));
        assert!(store.get_transactions_for_account(second.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_rows_surface_as_storage_errors() {
        let store = setup_test().await;
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO accounts (id, owner_id, balance, daily_limit) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(Uuid::new_v4().to_string())
            .bind("lots")
            .bind("1000")
            .execute(store.pool())
            .await
            .unwrap();

        let err = store.get_account(id).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
